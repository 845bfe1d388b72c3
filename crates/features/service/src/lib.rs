//! # Services
//!
//! Live Service machinery for the container:
//!
//! * [`ServiceInstance`] drives one behaviour plugin through
//!   `Uninitialized → Initializing → Configured → Ready → Closed`, resolving its configuration
//!   object from a Loader, a pre-built target, or the record itself.
//! * [`ProxyService`] wraps an instance and manages named Clients built by Connectors:
//!   create, connect, disconnect, remove, with documented partial-failure behaviour.
//! * [`dispatch`] parses string-addressed operations so that callers can drive any Proxy
//!   Service without knowing its concrete type.
//!
//! ```rust
//! use keystone_kernel::testing::{EchoService, MockConnectorFactory};
//! use keystone_kernel::{Catalog, Loader, ScopeContext};
//! use keystone_service::{ProxyService, ServiceInstance};
//! use keystone_domain::Parameters;
//! use std::sync::Arc;
//!
//! struct Root;
//! impl ScopeContext for Root {
//!     fn scope_name(&self) -> &str { "root" }
//!     fn loader(&self, _id: &str) -> Option<Arc<dyn Loader>> { None }
//! }
//!
//! let catalog = Catalog::new().with_connector("mock", MockConnectorFactory::default());
//! let instance = Arc::new(ServiceInstance::new(Box::new(EchoService::default())));
//! instance.init(Some(&Root), "db", None).unwrap();
//!
//! let proxy = ProxyService::new(instance, catalog);
//! let params = Parameters::new()
//!     .with("client-name", "primary")
//!     .with("connector-type", "mock")
//!     .with("connector-parameters", serde_json::json!({ "connect-on-create": true }));
//! proxy.execute("create-client", &params).unwrap();
//! assert!(proxy.is_connected("primary").unwrap());
//! ```

pub mod dispatch;
mod error;
mod handle;
mod lifecycle;
mod proxy;

pub use crate::dispatch::Operation;
pub use crate::error::{ServiceError, ServiceErrorExt};
pub use crate::handle::ServiceHandle;
pub use crate::lifecycle::{ServiceInstance, ServiceState};
pub use crate::proxy::ProxyService;
