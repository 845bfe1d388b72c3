//! # Domain Models
//!
//! Declarative configuration records for the container: the ordered parameter store,
//! Provider/Service/Client/Object Reference records, and the hierarchical [`ScopeConfig`].
//! Keep it lean: no I/O, no locking, no live instances. Just data, structural merge, and
//! the one-way [`ServiceSpec::promote`] transition.
//!
//! ## Collapsing collections
//! Every collection a record owns (parameters, providers, services, clients, object
//! references, child scopes) is held as an `Option`. Removing the last entry nulls the
//! option, so "nothing configured" and "explicitly emptied" are the same observable state.
//!
//! ```rust
//! use keystone_domain::{Parameterized, ServiceConfig};
//!
//! let mut service = ServiceConfig::new("db", "pool");
//! service.set_parameter("url", "postgres://localhost");
//! assert!(service.has_parameters());
//!
//! service.remove_parameter("url");
//! assert!(!service.has_parameters());
//! ```

pub mod config;
pub mod constants;
pub mod named;
pub mod parameters;
pub mod severity;

pub use config::{
    ClientConfig, ConfigSource, ObjectReferenceConfig, ProviderConfig, ProxyServiceConfig,
    ScopeConfig, ServiceConfig, ServiceSpec,
};
pub use named::{Collection, Named, NamedMap};
pub use parameters::{Parameter, Parameterized, Parameters, Value};
pub use severity::Severity;
