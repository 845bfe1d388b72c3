use keystone_domain::{Parameters, Severity, Value};
use std::borrow::Cow;
use std::sync::Arc;

#[keystone_derive::keystone_error]
pub enum LoaderError {
    #[error("Configuration load failed{}: {message}", format_context(.context))]
    Load { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(warning)]
    #[error("Loader parameter missing{}: {message}", format_context(.context))]
    MissingParameter { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[cfg(not(target_arch = "wasm32"))]
    #[error("Configuration source error{}: {source}", format_context(.context))]
    Config { source: crate::config::ConfigError, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Loader internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Produces a Service's configuration object at init time.
pub trait Loader: Send + Sync {
    /// Returns `None` when the Loader has nothing for this Service (the Service stays unconfigured).
    ///
    /// # Errors
    /// Returns an error if the configuration source exists but cannot be read.
    fn load(
        &self,
        scope: &str,
        loader_id: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Option<Value>, LoaderError>;
}

impl<F> Loader for F
where
    F: Fn(&str, &str, Option<&Parameters>) -> Result<Option<Value>, LoaderError> + Send + Sync,
{
    fn load(
        &self,
        scope: &str,
        loader_id: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Option<Value>, LoaderError> {
        self(scope, loader_id, parameters)
    }
}

/// What a Service sees of its owning Scope while it initializes.
pub trait ScopeContext {
    fn scope_name(&self) -> &str;

    /// Looks up a Loader by id.
    fn loader(&self, id: &str) -> Option<Arc<dyn Loader>>;
}
