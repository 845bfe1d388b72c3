use keystone_domain::Severity;
use keystone_kernel::{ConnectorError, LoaderError, PluginError};
use std::borrow::Cow;

/// Error types raised by Service instances, Proxy Services and the operation dispatcher.
#[keystone_derive::keystone_error]
pub enum ServiceError {
    #[error("Invalid service configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A required operation parameter is absent. `message` names the key.
    #[error("Missing parameter{}: {message}", format_context(.context))]
    MissingParameter { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An operation parameter has the wrong shape. `message` names the key.
    #[error("Invalid parameter{}: {message}", format_context(.context))]
    InvalidParameter { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid service state{}: {message}", format_context(.context))]
    InvalidState { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Client already exists{}: {message}", format_context(.context))]
    ClientExists { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Client not found{}: {message}", format_context(.context))]
    ClientNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unknown connector{}: {message}", format_context(.context))]
    UnknownConnector { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unknown loader{}: {message}", format_context(.context))]
    UnknownLoader { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(warning)]
    #[error("No such operation{}: {message}", format_context(.context))]
    UnsupportedOperation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(warning)]
    #[error("Unsupported capability{}: {message}", format_context(.context))]
    UnsupportedCapability { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Connector failure{}: {source}", format_context(.context))]
    Connector { source: ConnectorError, context: Option<Cow<'static, str>> },

    #[error("Configuration loader failure{}: {source}", format_context(.context))]
    Loader { source: LoaderError, context: Option<Cow<'static, str>> },

    #[error("Service behaviour failure{}: {source}", format_context(.context))]
    Plugin { source: PluginError, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Internal service error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ServiceError {
    /// Severity of the failure, looking through wrapped collaborator errors.
    #[must_use]
    pub const fn effective_severity(&self) -> Severity {
        match self {
            Self::Connector { source, .. } => source.severity(),
            Self::Loader { source, .. } => source.severity(),
            Self::Plugin { source, .. } => source.severity(),
            _ => self.severity(),
        }
    }

    pub(crate) fn missing(key: &'static str) -> Self {
        Self::MissingParameter { message: key.into(), context: None }
    }

    pub(crate) fn invalid(key: &'static str) -> Self {
        Self::InvalidParameter { message: key.into(), context: None }
    }

    pub(crate) fn client_not_found(name: &str, context: String) -> Self {
        Self::ClientNotFound { message: name.to_owned().into(), context: Some(context.into()) }
    }
}
