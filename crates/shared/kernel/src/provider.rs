use keystone_domain::{ProviderConfig, Severity};
use std::any::Any;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

/// Opaque, shareable object handed out by Providers and Clients.
pub type Object = Arc<dyn Any + Send + Sync>;

#[keystone_derive::keystone_error]
pub enum ProviderError {
    #[error("Provider initialization failed{}: {message}", format_context(.context))]
    Init { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(warning)]
    #[error("Provider object not found{}: {message}", format_context(.context))]
    ObjectNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Provider internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Named object factory living in a Scope.
pub trait Provider: Debug + Send + Sync {
    /// Looks up an object by name in this Provider's catalog.
    fn object(&self, name: &str) -> Option<Object>;
}

/// Builds a live Provider from its configuration record.
pub trait ProviderFactory: Send + Sync {
    /// # Errors
    /// Returns an error if the Provider cannot be built from `config`.
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> + Send + Sync,
{
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
        self(config)
    }
}
