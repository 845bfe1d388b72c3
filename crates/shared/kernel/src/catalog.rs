//! Injected plugin registry.
//! Maps implementation, connector and loader ids to the factories that build live collaborators.

use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::connector::ConnectorFactory;
use crate::loader::Loader;
use crate::plugin::ServiceFactory;
use crate::provider::ProviderFactory;

struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: RwLock<FxHashMap<String, Arc<T>>>,
}

impl<T: ?Sized> Registry<T> {
    fn new(kind: &'static str) -> Self {
        Self { kind, entries: RwLock::new(FxHashMap::default()) }
    }

    fn register(&self, id: impl Into<String>, entry: Arc<T>) {
        let id = id.into();
        if self.entries.write().insert(id.clone(), entry).is_some() {
            warn!(kind = self.kind, %id, "Replacing registered factory");
        } else {
            debug!(kind = self.kind, %id, "Registered factory");
        }
    }

    fn get(&self, id: &str) -> Option<Arc<T>> {
        self.entries.read().get(id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("kind", &self.kind).field("ids", &self.ids()).finish()
    }
}

/// Plugin catalog consulted whenever the container instantiates a collaborator.
///
/// Cheap to clone; clones share the same registrations.
#[derive(Clone, Debug)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

#[derive(Debug)]
struct CatalogInner {
    services: Registry<dyn ServiceFactory>,
    providers: Registry<dyn ProviderFactory>,
    connectors: Registry<dyn ConnectorFactory>,
    loaders: Registry<dyn Loader>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                services: Registry::new("service"),
                providers: Registry::new("provider"),
                connectors: Registry::new("connector"),
                loaders: Registry::new("loader"),
            }),
        }
    }

    pub fn register_service(&self, id: impl Into<String>, factory: impl ServiceFactory + 'static) {
        self.inner.services.register(id, Arc::new(factory));
    }

    pub fn register_provider(&self, id: impl Into<String>, factory: impl ProviderFactory + 'static) {
        self.inner.providers.register(id, Arc::new(factory));
    }

    pub fn register_connector(
        &self,
        id: impl Into<String>,
        factory: impl ConnectorFactory + 'static,
    ) {
        self.inner.connectors.register(id, Arc::new(factory));
    }

    pub fn register_loader(&self, id: impl Into<String>, loader: impl Loader + 'static) {
        self.inner.loaders.register(id, Arc::new(loader));
    }

    /// Builder-style [`Self::register_service`].
    #[must_use]
    pub fn with_service(self, id: impl Into<String>, factory: impl ServiceFactory + 'static) -> Self {
        self.register_service(id, factory);
        self
    }

    #[must_use]
    pub fn with_provider(
        self,
        id: impl Into<String>,
        factory: impl ProviderFactory + 'static,
    ) -> Self {
        self.register_provider(id, factory);
        self
    }

    #[must_use]
    pub fn with_connector(
        self,
        id: impl Into<String>,
        factory: impl ConnectorFactory + 'static,
    ) -> Self {
        self.register_connector(id, factory);
        self
    }

    #[must_use]
    pub fn with_loader(self, id: impl Into<String>, loader: impl Loader + 'static) -> Self {
        self.register_loader(id, loader);
        self
    }

    #[must_use]
    pub fn service(&self, id: &str) -> Option<Arc<dyn ServiceFactory>> {
        self.inner.services.get(id)
    }

    #[must_use]
    pub fn provider(&self, id: &str) -> Option<Arc<dyn ProviderFactory>> {
        self.inner.providers.get(id)
    }

    #[must_use]
    pub fn connector(&self, id: &str) -> Option<Arc<dyn ConnectorFactory>> {
        self.inner.connectors.get(id)
    }

    #[must_use]
    pub fn loader(&self, id: &str) -> Option<Arc<dyn Loader>> {
        self.inner.loaders.get(id)
    }

    /// Registered connector ids, sorted (for diagnostics).
    #[must_use]
    pub fn connector_ids(&self) -> Vec<String> {
        self.inner.connectors.ids()
    }

    #[must_use]
    pub fn service_ids(&self) -> Vec<String> {
        self.inner.services.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoService, MockConnectorFactory, StaticLoader};
    use serde_json::json;

    #[test]
    fn clones_share_registrations() {
        let catalog = Catalog::new();
        let clone = catalog.clone();
        clone.register_connector("mock", MockConnectorFactory::default());

        assert!(catalog.connector("mock").is_some());
        assert!(catalog.connector("other").is_none());
        assert_eq!(catalog.connector_ids(), ["mock"]);
    }

    #[test]
    fn builder_registers_every_kind() {
        let catalog = Catalog::new()
            .with_service("echo", EchoService::factory())
            .with_connector("mock", MockConnectorFactory::default())
            .with_loader("static", StaticLoader::new(json!({"k": 1})));

        assert_eq!(catalog.service_ids(), ["echo"]);
        assert!(catalog.loader("static").is_some());
        assert!(catalog.provider("static").is_none());
    }
}
