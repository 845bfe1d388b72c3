//! Name-keyed collections with insertion order and collapse-to-absent semantics.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Anything that can report emptiness so its optional slot can be collapsed.
pub trait Collection {
    fn is_empty(&self) -> bool;
}

/// Nulls `slot` when the collection it holds has become empty.
pub fn collapse<C: Collection>(slot: &mut Option<C>) {
    if slot.as_ref().is_some_and(Collection::is_empty) {
        *slot = None;
    }
}

/// A record addressed by name inside its owning collection.
pub trait Named {
    fn name(&self) -> &str;

    /// Renames the record. Records that own collections restamp their items afterwards.
    fn set_name(&mut self, name: String);

    /// Stamps the owning container's name onto the record.
    fn set_owner(&mut self, owner: &str);
}

/// Insertion-ordered map of [`Named`] records. Names are unique and matched exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMap<T> {
    items: Vec<T>,
}

impl<T> Default for NamedMap<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Named> NamedMap<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Inserts `item`, replacing (in place) a prior record of the same name.
    pub fn insert(&mut self, item: T) -> Option<T> {
        match self.position(item.name()) {
            Some(idx) => Some(std::mem::replace(&mut self.items[idx], item)),
            None => {
                self.items.push(item);
                None
            },
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|i| i.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|i| i.name() == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        self.position(name).map(|idx| self.items.remove(idx))
    }

    /// Replaces the record named `name` with `f(record)`, keeping its position.
    ///
    /// Returns `false` when no such record exists.
    pub fn update(&mut self, name: &str, f: impl FnOnce(T) -> T) -> bool {
        let Some(idx) = self.position(name) else {
            return false;
        };
        let item = self.items.remove(idx);
        self.items.insert(idx, f(item));
        true
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(Named::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stamps `owner` onto every record.
    pub fn set_owner(&mut self, owner: &str) {
        for item in &mut self.items {
            item.set_owner(owner);
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|i| i.name() == name)
    }
}

impl<T: Named> Collection for NamedMap<T> {
    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Named> FromIterator<T> for NamedMap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut map = Self::new();
        for item in iter {
            map.insert(item);
        }
        map
    }
}

impl<T> IntoIterator for NamedMap<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a NamedMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Inserts into an optional map, allocating it on first use.
pub fn insert_into<T: Named>(slot: &mut Option<NamedMap<T>>, item: T) -> Option<T> {
    slot.get_or_insert_with(NamedMap::new).insert(item)
}

/// Removes from an optional map, collapsing it to `None` once empty.
pub fn remove_from<T: Named>(slot: &mut Option<NamedMap<T>>, name: &str) -> Option<T> {
    let removed = slot.as_mut().and_then(|map| map.remove(name));
    collapse(slot);
    removed
}

impl<T: Named + Serialize> Serialize for NamedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for item in &self.items {
            map.serialize_entry(item.name(), item)?;
        }
        map.end()
    }
}

impl<'de, T: Named + Deserialize<'de>> Deserialize<'de> for NamedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedMapVisitor<T>(PhantomData<T>);

        impl<'de, T: Named + Deserialize<'de>> Visitor<'de> for NamedMapVisitor<T> {
            type Value = NamedMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of names to records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<NamedMap<T>, A::Error> {
                let mut map = NamedMap::new();
                while let Some((name, mut item)) = access.next_entry::<String, T>()? {
                    item.set_name(name);
                    map.insert(item);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(NamedMapVisitor(PhantomData))
    }
}
