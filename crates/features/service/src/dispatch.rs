//! String-addressed operations on a Proxy Service.
//!
//! | operation            | required                         | optional               | result      |
//! |----------------------|----------------------------------|------------------------|-------------|
//! | `create-client`      | `client-name`, `connector-type`  | `connector-parameters` | unit        |
//! | `remove-client`      | `client-name`                    |                        | unit        |
//! | `remove-all-clients` |                                  |                        | unit        |
//! | `connect`            | `client-name`                    |                        | unit        |
//! | `disconnect`         | `client-name`                    |                        | unit        |
//! | `disconnect-all`     |                                  |                        | unit        |
//! | `is-connected`       | `client-name`                    |                        | bool        |
//! | `has-client`         | `client-name`                    |                        | bool        |
//! | `is-client-type`     | `client-name`, `client-type`     |                        | bool        |
//! | `get-client-names`   |                                  |                        | string list |
//! | `get-connection`     | `client-name`                    |                        | handle      |
//!
//! Parameters are validated in table order before anything runs. Names outside the table are
//! forwarded to the Service behaviour.

use keystone_domain::{Parameters, Value};
use keystone_kernel::Output;

use crate::error::ServiceError;
use crate::proxy::ProxyService;

/// Operation names.
pub mod ops {
    pub const CREATE_CLIENT: &str = "create-client";
    pub const REMOVE_CLIENT: &str = "remove-client";
    pub const REMOVE_ALL_CLIENTS: &str = "remove-all-clients";
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const DISCONNECT_ALL: &str = "disconnect-all";
    pub const IS_CONNECTED: &str = "is-connected";
    pub const HAS_CLIENT: &str = "has-client";
    pub const IS_CLIENT_TYPE: &str = "is-client-type";
    pub const GET_CLIENT_NAMES: &str = "get-client-names";
    pub const GET_CONNECTION: &str = "get-connection";
}

/// Operation parameter keys.
pub mod keys {
    pub const CLIENT_NAME: &str = "client-name";
    pub const CONNECTOR_TYPE: &str = "connector-type";
    pub const CONNECTOR_PARAMETERS: &str = "connector-parameters";
    pub const CLIENT_TYPE: &str = "client-type";
}

/// A validated, typed operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateClient { name: String, connector: String, parameters: Option<Parameters> },
    RemoveClient { name: String },
    RemoveAllClients,
    Connect { name: String },
    Disconnect { name: String },
    DisconnectAll,
    IsConnected { name: String },
    HasClient { name: String },
    IsClientType { name: String, kind: String },
    GetClientNames,
    GetConnection { name: String },
}

fn required_str(parameters: &Parameters, key: &'static str) -> Result<String, ServiceError> {
    match parameters.get(key) {
        None | Some(Value::Null) => Err(ServiceError::missing(key)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(ServiceError::invalid(key)),
    }
}

fn optional_map(parameters: &Parameters, key: &'static str) -> Result<Option<Parameters>, ServiceError> {
    match parameters.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => {
            let map = Parameters::from_map(value);
            Ok((!map.is_empty()).then_some(map))
        },
        Some(_) => Err(ServiceError::invalid(key)),
    }
}

impl Operation {
    /// Parses and validates `operation`.
    ///
    /// Returns `Ok(None)` for names this layer does not handle.
    ///
    /// # Errors
    /// [`ServiceError::MissingParameter`] or [`ServiceError::InvalidParameter`] naming the first
    /// offending key.
    pub fn parse(operation: &str, parameters: &Parameters) -> Result<Option<Self>, ServiceError> {
        let name = || required_str(parameters, keys::CLIENT_NAME);
        let op = match operation {
            ops::CREATE_CLIENT => Self::CreateClient {
                name: name()?,
                connector: required_str(parameters, keys::CONNECTOR_TYPE)?,
                parameters: optional_map(parameters, keys::CONNECTOR_PARAMETERS)?,
            },
            ops::REMOVE_CLIENT => Self::RemoveClient { name: name()? },
            ops::REMOVE_ALL_CLIENTS => Self::RemoveAllClients,
            ops::CONNECT => Self::Connect { name: name()? },
            ops::DISCONNECT => Self::Disconnect { name: name()? },
            ops::DISCONNECT_ALL => Self::DisconnectAll,
            ops::IS_CONNECTED => Self::IsConnected { name: name()? },
            ops::HAS_CLIENT => Self::HasClient { name: name()? },
            ops::IS_CLIENT_TYPE => Self::IsClientType {
                name: name()?,
                kind: required_str(parameters, keys::CLIENT_TYPE)?,
            },
            ops::GET_CLIENT_NAMES => Self::GetClientNames,
            ops::GET_CONNECTION => Self::GetConnection { name: name()? },
            _ => return Ok(None),
        };
        Ok(Some(op))
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateClient { .. } => ops::CREATE_CLIENT,
            Self::RemoveClient { .. } => ops::REMOVE_CLIENT,
            Self::RemoveAllClients => ops::REMOVE_ALL_CLIENTS,
            Self::Connect { .. } => ops::CONNECT,
            Self::Disconnect { .. } => ops::DISCONNECT,
            Self::DisconnectAll => ops::DISCONNECT_ALL,
            Self::IsConnected { .. } => ops::IS_CONNECTED,
            Self::HasClient { .. } => ops::HAS_CLIENT,
            Self::IsClientType { .. } => ops::IS_CLIENT_TYPE,
            Self::GetClientNames => ops::GET_CLIENT_NAMES,
            Self::GetConnection { .. } => ops::GET_CONNECTION,
        }
    }

    /// Runs the operation against `proxy` through its typed API.
    ///
    /// # Errors
    /// Whatever the typed call returns.
    pub fn apply(self, proxy: &ProxyService) -> Result<Output, ServiceError> {
        match self {
            Self::CreateClient { name, connector, parameters } => {
                proxy.create_client(&name, &connector, parameters.as_ref()).map(|()| Output::Unit)
            },
            Self::RemoveClient { name } => proxy.remove_client(&name).map(|()| Output::Unit),
            Self::RemoveAllClients => proxy.remove_all_clients().map(|()| Output::Unit),
            Self::Connect { name } => proxy.connect(&name).map(|()| Output::Unit),
            Self::Disconnect { name } => proxy.disconnect(&name).map(|()| Output::Unit),
            Self::DisconnectAll => proxy.disconnect_all().map(|()| Output::Unit),
            Self::IsConnected { name } => proxy.is_connected(&name).map(Output::from),
            Self::HasClient { name } => Ok(proxy.has_client(&name).into()),
            Self::IsClientType { name, kind } => proxy.is_client_type(&name, &kind).map(Output::from),
            Self::GetClientNames => {
                let names = proxy.client_names().into_iter().map(Value::String).collect();
                Ok(Output::Value(Value::Array(names)))
            },
            Self::GetConnection { name } => proxy.connection(&name).map(Output::Handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_client_validates_in_table_order() {
        let err = Operation::parse(ops::CREATE_CLIENT, &Parameters::new()).unwrap_err();
        assert!(matches!(&err, ServiceError::MissingParameter { message, .. } if message == keys::CLIENT_NAME));

        let params = Parameters::new().with(keys::CONNECTOR_TYPE, "mock");
        let err = Operation::parse(ops::CREATE_CLIENT, &params).unwrap_err();
        assert!(matches!(&err, ServiceError::MissingParameter { message, .. } if message == keys::CLIENT_NAME));

        let params = Parameters::new().with(keys::CLIENT_NAME, "a");
        let err = Operation::parse(ops::CREATE_CLIENT, &params).unwrap_err();
        assert!(matches!(&err, ServiceError::MissingParameter { message, .. } if message == keys::CONNECTOR_TYPE));
    }

    #[test]
    fn wrong_shapes_are_invalid() {
        let params = Parameters::new().with(keys::CLIENT_NAME, 5);
        assert!(matches!(
            Operation::parse(ops::CONNECT, &params),
            Err(ServiceError::InvalidParameter { .. })
        ));

        let params = Parameters::new()
            .with(keys::CLIENT_NAME, "a")
            .with(keys::CONNECTOR_TYPE, "mock")
            .with(keys::CONNECTOR_PARAMETERS, "not a map");
        let err = Operation::parse(ops::CREATE_CLIENT, &params).unwrap_err();
        assert!(matches!(&err, ServiceError::InvalidParameter { message, .. } if message == keys::CONNECTOR_PARAMETERS));
    }

    #[test]
    fn parses_typed_operations() {
        let params = Parameters::new()
            .with(keys::CLIENT_NAME, "a")
            .with(keys::CONNECTOR_TYPE, "mock")
            .with(keys::CONNECTOR_PARAMETERS, json!({"connect-on-create": true}));

        let op = Operation::parse(ops::CREATE_CLIENT, &params).unwrap().unwrap();
        assert_eq!(op.name(), ops::CREATE_CLIENT);
        assert_eq!(
            op,
            Operation::CreateClient {
                name: "a".to_owned(),
                connector: "mock".to_owned(),
                parameters: Some(Parameters::new().with("connect-on-create", true)),
            }
        );

        let params = Parameters::new().with(keys::CLIENT_NAME, "a").with(keys::CLIENT_TYPE, "redis");
        assert_eq!(
            Operation::parse(ops::IS_CLIENT_TYPE, &params).unwrap(),
            Some(Operation::IsClientType { name: "a".to_owned(), kind: "redis".to_owned() })
        );
        assert_eq!(
            Operation::parse(ops::GET_CLIENT_NAMES, &Parameters::new()).unwrap(),
            Some(Operation::GetClientNames)
        );
    }

    #[test]
    fn unknown_names_are_not_parsed() {
        assert_eq!(Operation::parse("frobnicate", &Parameters::new()).unwrap(), None);
    }
}
