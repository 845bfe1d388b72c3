use keystone_domain::{Parameters, ServiceSpec, Severity, Value};
use std::borrow::Cow;
use std::fmt::Debug;

use crate::provider::Object;

#[keystone_derive::keystone_error]
pub enum PluginError {
    #[error("Service configuration rejected{}: {message}", format_context(.context))]
    Configure { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Service operation failed{}: {message}", format_context(.context))]
    Execute { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(warning)]
    #[error("No such operation{}: {message}", format_context(.context))]
    UnsupportedOperation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Service shutdown failed{}: {message}", format_context(.context))]
    Shutdown { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Service internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Result of a dispatched operation.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Unit,
    Value(Value),
    Handle(Object),
}

impl Output {
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Value(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_handle(self) -> Option<Object> {
        match self {
            Self::Handle(handle) => Some(handle),
            _ => None,
        }
    }
}

impl From<bool> for Output {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Behaviour plugged into a Service instance.
pub trait Service: Debug + Send {
    /// Applies the configuration object. Called at most once per lifecycle.
    ///
    /// # Errors
    /// Returns an error if the configuration object is rejected.
    fn configure(&mut self, config: &Value) -> Result<(), PluginError>;

    /// Handles an operation the container does not know about.
    ///
    /// # Errors
    /// Defaults to [`PluginError::UnsupportedOperation`].
    fn execute(&mut self, operation: &str, _parameters: &Parameters) -> Result<Output, PluginError> {
        Err(PluginError::UnsupportedOperation {
            message: operation.to_owned().into(),
            context: None,
        })
    }

    /// # Errors
    /// Returns an error if resources cannot be released; the Service then keeps its state.
    fn shutdown(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Builds a Service behaviour from its registration.
pub trait ServiceFactory: Send + Sync {
    /// # Errors
    /// Returns an error if the behaviour cannot be built for `spec`.
    fn create(&self, spec: &ServiceSpec) -> Result<Box<dyn Service>, PluginError>;
}

impl<F> ServiceFactory for F
where
    F: Fn(&ServiceSpec) -> Result<Box<dyn Service>, PluginError> + Send + Sync,
{
    fn create(&self, spec: &ServiceSpec) -> Result<Box<dyn Service>, PluginError> {
        self(spec)
    }
}
