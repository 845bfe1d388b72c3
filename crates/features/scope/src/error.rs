use keystone_domain::Severity;
use keystone_kernel::{PluginError, ProviderError};
use keystone_service::ServiceError;
use std::borrow::Cow;

/// Error types raised by the Scope registry and resolver.
#[keystone_derive::keystone_error]
pub enum ScopeError {
    #[error("Invalid scope configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A live instance already holds this name.
    #[error("Duplicate registration{}: {message}", format_context(.context))]
    Duplicate { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(warning)]
    #[error("Service not found{}: {message}", format_context(.context))]
    ServiceNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Service is not a proxy service{}: {message}", format_context(.context))]
    NotProxy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unknown implementation{}: {message}", format_context(.context))]
    UnknownImplementation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Service failure{}: {source}", format_context(.context))]
    Service { source: ServiceError, context: Option<Cow<'static, str>> },

    #[error("Provider failure{}: {source}", format_context(.context))]
    Provider { source: ProviderError, context: Option<Cow<'static, str>> },

    #[error("Service factory failure{}: {source}", format_context(.context))]
    Plugin { source: PluginError, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Internal scope error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
