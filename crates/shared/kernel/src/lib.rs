//! Kernel contracts shared by the container slices.
//! Keep this crate narrow: it names what the container consumes from the outside world
//! (Service behaviours, Providers, Connectors, Clients, Loaders), the injected [`Catalog`]
//! that maps implementation ids to factories, and the file-backed configuration layer.
//!
//! ## Registering plugins
//! Closures implement every factory trait, so most registrations are one-liners:
//! ```rust
//! use keystone_kernel::{Catalog, Provider, ProviderError};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Empty;
//!
//! impl Provider for Empty {
//!     fn object(&self, _name: &str) -> Option<keystone_kernel::Object> {
//!         None
//!     }
//! }
//!
//! let catalog = Catalog::new();
//! catalog.register_provider("empty", |_: &keystone_domain::ProviderConfig| {
//!     Ok::<_, ProviderError>(Arc::new(Empty) as Arc<dyn Provider>)
//! });
//! assert!(catalog.provider("empty").is_some());
//! ```
//!
//! ## Config loading (non-wasm)
//! ```rust,ignore
//! use keystone_kernel::config::load_scope_config;
//! let scope = load_scope_config("config/app.toml").unwrap();
//! ```

pub mod catalog;
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
pub mod connector;
pub mod loader;
pub mod plugin;
pub mod prelude;
pub mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use catalog::Catalog;
pub use connector::{Client, Connector, ConnectorError, ConnectorFactory, ServiceRef};
pub use loader::{Loader, LoaderError, ScopeContext};
pub use plugin::{Output, PluginError, Service, ServiceFactory};
pub use provider::{Object, Provider, ProviderError, ProviderFactory};

pub use keystone_domain as domain;
