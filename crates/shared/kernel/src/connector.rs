use keystone_domain::{Parameters, Severity};
use std::borrow::Cow;
use std::fmt::Debug;

use crate::provider::Object;

#[keystone_derive::keystone_error]
pub enum ConnectorError {
    #[error("Connector initialization failed{}: {message}", format_context(.context))]
    Init { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Connection failed{}: {message}", format_context(.context))]
    Connect { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Disconnect failed{}: {message}", format_context(.context))]
    Disconnect { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Client destroy failed{}: {message}", format_context(.context))]
    Destroy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Connector internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// The Proxy Service a Connector is building a Client for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRef<'a> {
    pub scope: &'a str,
    pub name: &'a str,
}

/// Connection-bearing object managed by a Proxy Service.
///
/// Transport lives entirely behind this trait; the container only decides when each call happens.
pub trait Client: Debug + Send {
    /// Type identifier matched by `is-client-type`.
    fn kind(&self) -> &str;

    /// # Errors
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self) -> Result<(), ConnectorError>;

    /// # Errors
    /// Returns an error if the connection cannot be closed cleanly.
    fn disconnect(&mut self) -> Result<(), ConnectorError>;

    /// Releases every resource held by the Client. Called once, after `disconnect`.
    ///
    /// # Errors
    /// Returns an error if resources cannot be released.
    fn destroy(&mut self) -> Result<(), ConnectorError>;

    fn is_connected(&self) -> bool;

    /// Underlying connection handle, for Clients that expose one.
    fn connection(&self) -> Option<Object> {
        None
    }
}

/// Owns one Client on behalf of a Proxy Service.
pub trait Connector: Debug + Send {
    fn client_name(&self) -> &str;

    fn client(&self) -> &dyn Client;

    fn client_mut(&mut self) -> &mut dyn Client;
}

/// Builds and initializes a Connector (and its Client) for a named Client slot.
pub trait ConnectorFactory: Send + Sync {
    /// # Errors
    /// Returns an error if the Connector rejects the parameters or cannot build its Client.
    fn init(
        &self,
        service: ServiceRef<'_>,
        client_name: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Box<dyn Connector>, ConnectorError>;
}

impl<F> ConnectorFactory for F
where
    F: Fn(ServiceRef<'_>, &str, Option<&Parameters>) -> Result<Box<dyn Connector>, ConnectorError>
        + Send
        + Sync,
{
    fn init(
        &self,
        service: ServiceRef<'_>,
        client_name: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Box<dyn Connector>, ConnectorError> {
        self(service, client_name, parameters)
    }
}
