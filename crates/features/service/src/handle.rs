use keystone_domain::Parameters;
use keystone_kernel::{Catalog, Output};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::lifecycle::{ServiceInstance, ServiceState};
use crate::proxy::ProxyService;

/// A live Service as cached by its Scope.
#[derive(Debug, Clone)]
pub enum ServiceHandle {
    Plain(Arc<ServiceInstance>),
    Proxy(Arc<ProxyService>),
}

impl ServiceHandle {
    /// The lifecycle instance, shared by both forms.
    #[must_use]
    pub fn instance(&self) -> &Arc<ServiceInstance> {
        match self {
            Self::Plain(instance) => instance,
            Self::Proxy(proxy) => proxy.instance(),
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.instance().name()
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.instance().state()
    }

    #[must_use]
    pub const fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    #[must_use]
    pub fn as_proxy(&self) -> Option<Arc<ProxyService>> {
        match self {
            Self::Proxy(proxy) => Some(Arc::clone(proxy)),
            Self::Plain(_) => None,
        }
    }

    /// Wraps a plain instance into a Proxy Service; Proxy handles are returned unchanged.
    #[must_use]
    pub fn promote(self, catalog: &Catalog) -> Self {
        match self {
            Self::Plain(instance) => Self::Proxy(Arc::new(ProxyService::promote(instance, catalog.clone()))),
            proxy @ Self::Proxy(_) => proxy,
        }
    }

    /// # Errors
    /// See [`ProxyService::execute`] and [`ServiceInstance::execute`].
    pub fn execute(&self, operation: &str, parameters: &Parameters) -> Result<Output, ServiceError> {
        match self {
            Self::Plain(instance) => instance.execute(operation, parameters),
            Self::Proxy(proxy) => proxy.execute(operation, parameters),
        }
    }

    /// Closes the Service; Proxy Services remove their Clients first.
    ///
    /// # Errors
    /// See [`ProxyService::close`] and [`ServiceInstance::close`].
    pub fn close(&self) -> Result<(), ServiceError> {
        match self {
            Self::Plain(instance) => instance.close(),
            Self::Proxy(proxy) => proxy.close(),
        }
    }
}
