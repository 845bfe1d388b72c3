pub use crate::catalog::Catalog;
pub use crate::connector::{Client, Connector, ConnectorError, ConnectorFactory, ServiceRef};
pub use crate::loader::{Loader, LoaderError, ScopeContext};
pub use crate::plugin::{Output, PluginError, Service, ServiceFactory};
pub use crate::provider::{Object, Provider, ProviderError, ProviderFactory};
pub use keystone_domain::{Parameterized, Parameters, Severity, Value};
