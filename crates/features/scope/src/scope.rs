//! A live Scope: its configuration plus the Provider and Service instances built from it.
//!
//! Lookups check the Scope's own collection first, then walk upward through `parent`, or through
//! the domain when no parent is named. Each hop re-resolves the next Scope by name through the
//! registry and the current Scope's lock is released before the hop.

use fxhash::{FxHashMap, FxHashSet};
use keystone_domain::{
    ClientConfig, Named, ObjectReferenceConfig, Parameterized, ProviderConfig, ScopeConfig,
    ServiceSpec,
};
use keystone_kernel::{Catalog, Loader, Object, Provider, ScopeContext};
use keystone_service::{ProxyService, ServiceHandle, ServiceInstance};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

use crate::error::{ScopeError, ScopeErrorExt};
use crate::registry::RegistryInner;

#[derive(Debug)]
struct ScopeState {
    config: ScopeConfig,
    providers: FxHashMap<String, Arc<dyn Provider>>,
    services: FxHashMap<String, ServiceHandle>,
}

#[derive(Debug)]
pub struct Scope {
    name: String,
    registry: Weak<RegistryInner>,
    catalog: Catalog,
    state: Mutex<ScopeState>,
}

impl Scope {
    pub(crate) fn new(name: &str, registry: Weak<RegistryInner>, catalog: Catalog) -> Self {
        Self {
            name: name.to_owned(),
            registry,
            catalog,
            state: Mutex::new(ScopeState {
                config: ScopeConfig::new(name),
                providers: FxHashMap::default(),
                services: FxHashMap::default(),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> ScopeConfig {
        self.state.lock().config.clone()
    }

    #[must_use]
    pub fn parent(&self) -> Option<String> {
        self.state.lock().config.parent().map(ToOwned::to_owned)
    }

    #[must_use]
    pub fn domain(&self) -> Option<String> {
        self.state.lock().config.domain().map(ToOwned::to_owned)
    }

    pub fn set_domain(&self, domain: &str) {
        self.state.lock().config.set_domain(Some(domain.to_owned()));
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<keystone_domain::Value> {
        self.state.lock().config.parameter(name).cloned()
    }

    fn label(&self) -> String {
        format!("scope '{}'", self.name)
    }

    fn member_label(&self, kind: &str, name: &str) -> String {
        format!("scope '{}', {kind} '{name}'", self.name)
    }

    fn registry(&self) -> Result<Arc<RegistryInner>, ScopeError> {
        self.registry.upgrade().ok_or_else(|| ScopeError::Internal {
            message: "scope registry dropped".into(),
            context: Some(self.label().into()),
        })
    }

    fn lookup(&self, name: &str) -> Option<Arc<Self>> {
        self.registry.upgrade().and_then(|registry| registry.get(name))
    }

    /// Merges `source` into this Scope's configuration and registers its child Scopes.
    ///
    /// The Scope keeps its registry name; a differing name in `source` is ignored.
    ///
    /// # Errors
    /// Fails when a child Scope cannot be registered.
    pub fn update(&self, source: &ScopeConfig) -> Result<(), ScopeError> {
        let children: Vec<ScopeConfig> = {
            let mut state = self.state.lock();
            state.config.update(source);
            if state.config.name() != self.name {
                warn!(scope = %self.name, requested = %source.name(), "Scope rename ignored");
                state.config.set_name(self.name.clone());
            }
            source.scopes().into_iter().flatten().cloned().collect()
        };
        debug!(scope = %self.name, children = children.len(), "Scope configuration merged");

        for child in children {
            self.register_child(&child)?;
        }
        Ok(())
    }

    /// Places `child` in this Scope's context and registers it live with this Scope as domain.
    ///
    /// # Errors
    /// [`ScopeError::InvalidConfiguration`] for an unnamed child.
    pub fn add_child(&self, child: ScopeConfig) -> Result<Arc<Self>, ScopeError> {
        if child.name().is_empty() {
            return Err(ScopeError::InvalidConfiguration {
                message: "child scope name is empty".into(),
                context: Some(self.label().into()),
            });
        }
        self.state.lock().config.add_scope(child.clone());
        self.register_child(&child)
    }

    fn register_child(&self, child: &ScopeConfig) -> Result<Arc<Self>, ScopeError> {
        let registry = self.registry()?;
        let scope = registry.get_or_create(child.name()).context(self.label())?;
        scope.set_domain(&self.name);
        scope.update(child)?;
        debug!(scope = %self.name, child = %child.name(), "Child scope registered");
        Ok(scope)
    }

    /// Names of the Scopes in this Scope's context, in insertion order.
    #[must_use]
    pub fn children(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .config
            .scopes()
            .map(|scopes| scopes.names().into_iter().map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    }

    /// A child Scope from this Scope's context. Never consulted during resolution.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Arc<Self>> {
        let known = self.state.lock().config.scope(name).is_some();
        known.then(|| self.lookup(name)).flatten()
    }

    fn upward(&self) -> Option<String> {
        let state = self.state.lock();
        state.config.parent().or_else(|| state.config.domain()).map(ToOwned::to_owned)
    }

    fn resolve<T>(
        &self,
        kind: &'static str,
        name: &str,
        local: impl Fn(&Self, &str) -> Result<Option<T>, ScopeError>,
    ) -> Result<Option<T>, ScopeError> {
        if let Some(found) = local(self, name)? {
            return Ok(Some(found));
        }

        let mut visited = FxHashSet::default();
        visited.insert(self.name.clone());
        let mut next = self.upward();
        while let Some(target) = next {
            if !visited.insert(target.clone()) {
                warn!(scope = %self.name, at = %target, kind, name, "Cycle in scope chain, resolution stopped");
                return Ok(None);
            }
            let Some(scope) = self.lookup(&target) else {
                warn!(scope = %self.name, missing = %target, kind, name, "Upward scope not registered");
                return Ok(None);
            };
            trace!(scope = %self.name, hop = %target, kind, name, "Resolving upward");
            if let Some(found) = local(scope.as_ref(), name)? {
                return Ok(Some(found));
            }
            next = scope.upward();
        }
        Ok(None)
    }

    /// Resolves a Service, instantiating it in the Scope that declares it on first use.
    ///
    /// # Errors
    /// Instantiation failures: an unknown implementation id, a failing factory, or a failing
    /// init. Nothing is cached on failure.
    pub fn get_service(&self, name: &str) -> Result<Option<ServiceHandle>, ScopeError> {
        self.resolve("service", name, Self::local_service)
    }

    /// Resolves a Provider, instantiating it in the Scope that declares it on first use.
    ///
    /// # Errors
    /// An unknown implementation id or a failing factory.
    pub fn get_provider(&self, name: &str) -> Result<Option<Arc<dyn Provider>>, ScopeError> {
        self.resolve("provider", name, Self::local_provider)
    }

    /// # Errors
    /// Never fails today; shares the resolution signature.
    pub fn get_object_reference(
        &self,
        name: &str,
    ) -> Result<Option<ObjectReferenceConfig>, ScopeError> {
        self.resolve("object-reference", name, |scope, name| {
            Ok(scope.state.lock().config.object_reference(name).cloned())
        })
    }

    /// Resolves an Object Reference, its Provider (from the Scope owning the reference) and
    /// finally the object inside that Provider.
    ///
    /// # Errors
    /// Provider instantiation failures.
    pub fn resolve_object(&self, name: &str) -> Result<Option<Object>, ScopeError> {
        let Some(reference) = self.get_object_reference(name)? else {
            return Ok(None);
        };

        let owner = match reference.scope() {
            Some(owner) if owner != self.name => self.lookup(owner),
            _ => None,
        };
        let provider = match &owner {
            Some(scope) => scope.get_provider(&reference.provider)?,
            None => self.get_provider(&reference.provider)?,
        };
        let Some(provider) = provider else {
            warn!(scope = %self.name, reference = %name, provider = %reference.provider, "Provider for object reference not found");
            return Ok(None);
        };
        Ok(provider.object(&reference.object))
    }

    fn local_service(&self, name: &str) -> Result<Option<ServiceHandle>, ScopeError> {
        let mut state = self.state.lock();
        if let Some(handle) = state.services.get(name) {
            return Ok(Some(handle.clone()));
        }
        let Some(spec) = state.config.service(name).cloned() else {
            return Ok(None);
        };

        let handle = self.instantiate_service(&spec)?;
        state.services.insert(name.to_owned(), handle.clone());
        Ok(Some(handle))
    }

    fn instantiate_service(&self, spec: &ServiceSpec) -> Result<ServiceHandle, ScopeError> {
        let label = self.member_label("service", spec.name());
        let factory = self.catalog.service(spec.implementation()).ok_or_else(|| {
            ScopeError::UnknownImplementation {
                message: spec.implementation().to_owned().into(),
                context: Some(label.clone().into()),
            }
        })?;

        let behaviour = factory.create(spec).context(label.clone())?;
        let instance = Arc::new(ServiceInstance::new(behaviour));
        let parameters = spec.init_parameters();
        instance.init(Some(self as &dyn ScopeContext), spec.name(), parameters.as_ref()).context(label.clone())?;

        let handle = match spec.as_proxy() {
            Some(config) => {
                let proxy = ProxyService::with_clients(instance, self.catalog.clone(), config)
                    .context(label)?;
                ServiceHandle::Proxy(Arc::new(proxy))
            },
            None => ServiceHandle::Plain(instance),
        };
        info!(scope = %self.name, service = %spec.name(), proxy = handle.is_proxy(), "Service instantiated");
        Ok(handle)
    }

    fn local_provider(&self, name: &str) -> Result<Option<Arc<dyn Provider>>, ScopeError> {
        let mut state = self.state.lock();
        if let Some(provider) = state.providers.get(name) {
            return Ok(Some(Arc::clone(provider)));
        }
        let Some(config) = state.config.provider(name) else {
            return Ok(None);
        };

        let label = self.member_label("provider", name);
        let factory = self.catalog.provider(&config.implementation).ok_or_else(|| {
            ScopeError::UnknownImplementation {
                message: config.implementation.clone().into(),
                context: Some(label.clone().into()),
            }
        })?;
        let provider = factory.create(config).context(label)?;
        state.providers.insert(name.to_owned(), Arc::clone(&provider));
        info!(scope = %self.name, provider = %name, "Provider instantiated");
        Ok(Some(provider))
    }

    /// Resolves `name` and requires it to be a Proxy Service.
    ///
    /// # Errors
    /// [`ScopeError::ServiceNotFound`] or [`ScopeError::NotProxy`], plus instantiation failures.
    pub fn proxy(&self, name: &str) -> Result<Arc<ProxyService>, ScopeError> {
        let handle = self.get_service(name)?.ok_or_else(|| ScopeError::ServiceNotFound {
            message: name.to_owned().into(),
            context: Some(self.label().into()),
        })?;
        handle.as_proxy().ok_or_else(|| ScopeError::NotProxy {
            message: name.to_owned().into(),
            context: Some(self.label().into()),
        })
    }

    // Configuration mutators

    /// # Errors
    /// [`ScopeError::Duplicate`] when a live Provider holds the name.
    pub fn add_provider(&self, provider: ProviderConfig) -> Result<(), ScopeError> {
        let mut state = self.state.lock();
        if state.providers.contains_key(provider.name()) {
            return Err(self.duplicate("provider", provider.name()));
        }
        debug!(scope = %self.name, provider = %provider.name(), "Provider registered");
        state.config.add_provider(provider);
        Ok(())
    }

    /// # Errors
    /// [`ScopeError::Duplicate`] when a live Service holds the name.
    pub fn add_service(&self, service: impl Into<ServiceSpec>) -> Result<(), ScopeError> {
        let service = service.into();
        let mut state = self.state.lock();
        if state.services.contains_key(service.name()) {
            return Err(self.duplicate("service", service.name()));
        }
        debug!(scope = %self.name, service = %service.name(), proxy = service.is_proxy(), "Service registered");
        state.config.add_service(service);
        Ok(())
    }

    /// Object References have no live form; a record with the same name is replaced.
    pub fn add_object_reference(&self, reference: ObjectReferenceConfig) {
        debug!(scope = %self.name, reference = %reference.name(), "Object reference registered");
        self.state.lock().config.add_object_reference(reference);
    }

    fn duplicate(&self, kind: &str, name: &str) -> ScopeError {
        ScopeError::Duplicate {
            message: format!("live {kind} '{name}' already exists").into(),
            context: Some(self.label().into()),
        }
    }

    /// Drops a Provider record and its live instance.
    pub fn remove_provider(&self, name: &str) -> Option<ProviderConfig> {
        let mut state = self.state.lock();
        state.providers.remove(name);
        state.config.remove_provider(name)
    }

    /// Closes a live Service, then drops it and its record.
    ///
    /// # Errors
    /// A failing close keeps both the instance and the record.
    pub fn remove_service(&self, name: &str) -> Result<Option<ServiceSpec>, ScopeError> {
        let mut state = self.state.lock();
        if let Some(handle) = state.services.get(name) {
            handle.close().context(self.member_label("service", name))?;
            state.services.remove(name);
        }
        Ok(state.config.remove_service(name))
    }

    pub fn remove_object_reference(&self, name: &str) -> Option<ObjectReferenceConfig> {
        self.state.lock().config.remove_object_reference(name)
    }

    /// Attaches a Client to the Service registered here as `service`.
    ///
    /// A plain registration is promoted to its Proxy form under the same name first, and a live
    /// plain instance is wrapped into a Proxy Service keeping its lifecycle state. When the
    /// Service is live the Client is created immediately; the Client record is kept whenever the
    /// live Proxy Service holds the Client afterwards.
    ///
    /// # Errors
    /// * [`ScopeError::ServiceNotFound`] when this Scope declares no such Service.
    /// * Client creation failures from the live Proxy Service.
    pub fn attach_client(&self, service: &str, client: ClientConfig) -> Result<(), ScopeError> {
        let label = self.member_label("service", service);
        let mut state = self.state.lock();
        let is_proxy = match state.config.service(service) {
            Some(spec) => spec.is_proxy(),
            None => {
                return Err(ScopeError::ServiceNotFound {
                    message: service.to_owned().into(),
                    context: Some(self.label().into()),
                });
            },
        };

        if !is_proxy {
            state.config.promote_service(service);
            info!(scope = %self.name, service = %service, "Service registration promoted to proxy service");
        }

        let mut outcome = Ok(());
        let mut record = true;
        if let Some(handle) = state.services.remove(service) {
            let handle = handle.promote(&self.catalog);
            state.services.insert(service.to_owned(), handle.clone());
            let proxy = handle.as_proxy().ok_or_else(|| ScopeError::Internal {
                message: "promoted handle is not a proxy service".into(),
                context: Some(label.clone().into()),
            })?;

            let existed = proxy.has_client(client.name());
            outcome = proxy
                .create_client(client.name(), &client.connector, client.parameters())
                .context(label);
            record = !existed && proxy.has_client(client.name());
        }

        if record {
            if let Some(config) = state.config.service_mut(service).and_then(ServiceSpec::as_proxy_mut) {
                debug!(scope = %self.name, service = %service, client = %client.name(), "Client recorded");
                config.add_client(client);
            }
        }
        outcome
    }

    /// Closes every live Service and drops every live Provider.
    ///
    /// Configuration and child Scopes are untouched. A Service whose close fails stays cached.
    ///
    /// # Errors
    /// Returns the first close failure after every Service was attempted.
    pub fn teardown(&self) -> Result<(), ScopeError> {
        let mut state = self.state.lock();
        let mut names: Vec<String> = state.services.keys().cloned().collect();
        names.sort_unstable();

        let mut first = None;
        for name in names {
            let Some(handle) = state.services.remove(&name) else { continue };
            if let Err(err) = handle.close() {
                warn!(scope = %self.name, service = %name, error = %err, "Service close failed");
                let context = self.member_label("service", &name);
                state.services.insert(name, handle);
                first.get_or_insert(ScopeError::Service { source: err, context: Some(context.into()) });
            }
        }
        state.providers.clear();
        info!(scope = %self.name, "Scope torn down");
        first.map_or(Ok(()), Err)
    }

    /// Names of the Services instantiated in this Scope, sorted.
    #[must_use]
    pub fn live_service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().services.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn has_live_provider(&self, name: &str) -> bool {
        self.state.lock().providers.contains_key(name)
    }
}

impl ScopeContext for Scope {
    fn scope_name(&self) -> &str {
        &self.name
    }

    fn loader(&self, id: &str) -> Option<Arc<dyn Loader>> {
        self.catalog.loader(id)
    }
}
