//! Ordered, name-addressed parameter store.
//!
//! A store is a sequence of `(name, value)` pairs. Duplicate names are legal (they come in from
//! configuration files and from [`Parameters::push`]); every lookup answers with the **last** match.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub use serde_json::Value;

use crate::named::Collection;

/// A single named configuration value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Ordered parameter sequence with last-match lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<Parameter>,
}

impl Parameters {
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Builder-style `set`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Overwrites the last entry named `name` in place, or appends a new one.
    ///
    /// Returns the value that was replaced.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().rev().find(|p| p.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value)),
            None => {
                self.entries.push(Parameter { name, value });
                None
            },
        }
    }

    /// Appends unconditionally, shadowing any earlier entry of the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.push(Parameter::new(name, value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().rev().find(|p| p.name == name).map(|p| &p.value)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Boolean flag lookup: `true` or a case-insensitive `"true"` string.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        match self.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Deletes every entry named `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| p.name != name);
        before - self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|p| p.name == name)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    /// Distinct names in first-seen order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.entries.len());
        for p in &self.entries {
            if !names.contains(&p.name.as_str()) {
                names.push(&p.name);
            }
        }
        names
    }

    /// Merges `other` entry by entry with `set` semantics.
    pub fn extend_from(&mut self, other: &Self) {
        for p in &other.entries {
            self.set(p.name.clone(), p.value.clone());
        }
    }

    /// Flattens the store into a JSON object (last match wins).
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::with_capacity(self.entries.len());
        for p in &self.entries {
            map.insert(p.name.clone(), p.value.clone());
        }
        Value::Object(map)
    }

    /// Builds a store from a JSON object; any other value yields an empty store.
    #[must_use]
    pub fn from_map(value: &Value) -> Self {
        let mut params = Self::new();
        if let Value::Object(map) = value {
            for (k, v) in map {
                params.push(k.clone(), v.clone());
            }
        }
        params
    }
}

impl Collection for Parameters {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for p in &self.entries {
            map.serialize_entry(&p.name, &p.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = Parameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Parameters, A::Error> {
                let mut params = Parameters::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    params.push(name, value);
                }
                Ok(params)
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}

/// Records that own an optional parameter store.
///
/// The store is allocated on the first `set_parameter` and collapses back to `None` when its last
/// entry is removed.
pub trait Parameterized {
    fn parameters(&self) -> Option<&Parameters>;

    fn parameters_slot(&mut self) -> &mut Option<Parameters>;

    fn has_parameters(&self) -> bool {
        self.parameters().is_some_and(|p| !p.is_empty())
    }

    fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters().and_then(|p| p.get(name))
    }

    fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value>
    where
        Self: Sized,
    {
        self.parameters_slot().get_or_insert_with(Parameters::new).set(name, value)
    }

    fn remove_parameter(&mut self, name: &str) -> usize {
        let slot = self.parameters_slot();
        let removed = slot.as_mut().map_or(0, |p| p.remove(name));
        crate::named::collapse(slot);
        removed
    }

    fn clear_parameters(&mut self) {
        *self.parameters_slot() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_overwrites_in_place_and_keeps_order() {
        let mut params = Parameters::new().with("a", 1).with("b", 2);
        assert_eq!(params.set("a", 10), Some(json!(1)));

        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(params.get("a"), Some(&json!(10)));
    }

    #[test]
    fn lookup_returns_last_match() {
        let mut params = Parameters::new();
        params.push("k", "first");
        params.push("k", "second");

        assert_eq!(params.get_str("k"), Some("second"));
        assert_eq!(params.names(), ["k"]);
        assert_eq!(params.remove("k"), 2);
        assert!(params.is_empty());
    }

    #[test]
    fn flag_accepts_bool_and_case_insensitive_string() {
        let params = Parameters::new().with("a", true).with("b", "TRUE").with("c", "yes").with("d", 1);
        assert!(params.flag("a"));
        assert!(params.flag("b"));
        assert!(!params.flag("c"));
        assert!(!params.flag("d"));
        assert!(!params.flag("missing"));
    }

    #[test]
    fn serde_keeps_duplicates_and_order() {
        let params: Parameters = serde_json::from_str(r#"{"x": 1, "y": "two"}"#).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(serde_json::to_value(&params).unwrap(), json!({"x": 1, "y": "two"}));
        assert_eq!(Parameters::from_map(&params.to_value()), params);
    }
}
