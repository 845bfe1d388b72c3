//! # Scopes
//!
//! The Scope registry and resolver of the container.
//!
//! A [`ScopeRegistry`] maps names to live [`Scope`]s. Each Scope owns a
//! [`keystone_domain::ScopeConfig`] and lazily builds the Providers and Services it declares,
//! caching one live instance per name. Lookups fall back upward: to the Scope named as `parent`,
//! or to the domain Scope when no parent is named. A domain never looks into its children.
//!
//! ```rust
//! use keystone_domain::{ScopeConfig, ServiceConfig};
//! use keystone_kernel::Catalog;
//! use keystone_kernel::testing::EchoService;
//! use keystone_scope::ScopeRegistry;
//!
//! let catalog = Catalog::new().with_service("echo", EchoService::factory());
//! let registry = ScopeRegistry::new(catalog);
//!
//! let root = ScopeConfig::new("root").with_service(ServiceConfig::new("db", "echo"));
//! registry.register(&root).unwrap();
//! let app = registry.register(&ScopeConfig::new("app").with_parent("root")).unwrap();
//!
//! let db = app.get_service("db").unwrap().expect("inherited from root");
//! assert_eq!(db.instance().scope_name().as_deref(), Some("root"));
//! ```

mod error;
mod registry;
mod scope;

pub use crate::error::{ScopeError, ScopeErrorExt};
pub use crate::registry::ScopeRegistry;
pub use crate::scope::Scope;
