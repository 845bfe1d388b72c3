use fxhash::FxHashMap;
use keystone_domain::{Named, ScopeConfig};
use keystone_kernel::Catalog;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::ScopeError;
use crate::scope::Scope;

#[derive(Debug)]
pub(crate) struct RegistryInner {
    catalog: Catalog,
    scopes: RwLock<FxHashMap<String, Arc<Scope>>>,
}

impl RegistryInner {
    pub(crate) fn get(&self, name: &str) -> Option<Arc<Scope>> {
        self.scopes.read().get(name).cloned()
    }

    pub(crate) fn get_or_create(self: &Arc<Self>, name: &str) -> Result<Arc<Scope>, ScopeError> {
        if name.is_empty() {
            return Err(ScopeError::InvalidConfiguration {
                message: "scope name is empty".into(),
                context: None,
            });
        }
        if let Some(scope) = self.scopes.read().get(name) {
            return Ok(Arc::clone(scope));
        }

        let mut scopes = self.scopes.write();
        let scope = scopes.entry(name.to_owned()).or_insert_with(|| {
            info!(scope = %name, "Scope created");
            Arc::new(Scope::new(name, Arc::downgrade(self), self.catalog.clone()))
        });
        Ok(Arc::clone(scope))
    }

    pub(crate) fn register(self: &Arc<Self>, config: &ScopeConfig) -> Result<Arc<Scope>, ScopeError> {
        let scope = self.get_or_create(config.name())?;
        if let Some(domain) = config.domain() {
            scope.set_domain(domain);
        }
        scope.update(config)?;
        Ok(scope)
    }
}

/// Name-addressed registry of live Scopes.
///
/// Cheap to clone; clones share the same Scopes. Each name maps to at most one Scope for the
/// registry's lifetime, until it is removed or the registry is torn down.
#[derive(Debug, Clone)]
pub struct ScopeRegistry {
    inner: Arc<RegistryInner>,
}

impl ScopeRegistry {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self { inner: Arc::new(RegistryInner { catalog, scopes: RwLock::new(FxHashMap::default()) }) }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Returns the Scope registered as `name`, creating an empty one when absent.
    ///
    /// Concurrent callers asking for the same name all receive the same instance.
    ///
    /// # Errors
    /// [`ScopeError::InvalidConfiguration`] for an empty name.
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Scope>, ScopeError> {
        self.inner.get_or_create(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Scope>> {
        self.inner.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.scopes.read().contains_key(name)
    }

    /// Registered Scope names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.scopes.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.scopes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.scopes.read().is_empty()
    }

    /// Merges `config` into the Scope of the same name, creating it first when needed.
    /// Child Scopes in the record are registered as well.
    ///
    /// # Errors
    /// [`ScopeError::InvalidConfiguration`] when the record has no name.
    pub fn register(&self, config: &ScopeConfig) -> Result<Arc<Scope>, ScopeError> {
        let scope = self.inner.register(config)?;
        debug!(scope = %scope.name(), "Scope configuration registered");
        Ok(scope)
    }

    /// Tears a Scope down and drops it from the registry. Child Scopes stay registered.
    ///
    /// Returns `false` when no Scope of that name exists.
    ///
    /// # Errors
    /// A teardown failure keeps the Scope registered.
    pub fn remove(&self, name: &str) -> Result<bool, ScopeError> {
        let Some(scope) = self.get(name) else {
            warn!(scope = %name, "Remove of unknown scope ignored");
            return Ok(false);
        };
        scope.teardown()?;
        self.inner.scopes.write().remove(name);
        info!(scope = %name, "Scope removed");
        Ok(true)
    }

    /// Tears down every Scope, then empties the registry.
    ///
    /// Every Scope is attempted even when an earlier one fails.
    ///
    /// # Errors
    /// Returns the first teardown failure.
    pub fn teardown_all(&self) -> Result<(), ScopeError> {
        let scopes: Vec<Arc<Scope>> = {
            let mut scopes = self.inner.scopes.write();
            let mut drained: Vec<Arc<Scope>> = scopes.drain().map(|(_, scope)| scope).collect();
            drained.sort_unstable_by(|a, b| a.name().cmp(b.name()));
            drained
        };

        let mut first = None;
        for scope in scopes {
            if let Err(err) = scope.teardown() {
                warn!(scope = %scope.name(), error = %err, "Scope teardown failed");
                first.get_or_insert(err);
            }
        }
        info!("Scope registry torn down");
        first.map_or(Ok(()), Err)
    }
}
