//! Configuration records.
//!
//! Records are plain data: they know their name and owner, merge structurally, and serialize as
//! kebab-case tables with collections keyed by name. Live instances never appear here.

mod client;
mod provider;
mod reference;
mod scope;
mod service;

pub use client::ClientConfig;
pub use provider::ProviderConfig;
pub use reference::ObjectReferenceConfig;
pub use scope::ScopeConfig;
pub use service::{ConfigSource, ProxyServiceConfig, ServiceConfig, ServiceSpec};
