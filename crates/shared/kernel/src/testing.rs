//! Test doubles for container collaborators.
//!
//! Failure injection is driven by Client parameters so that a single registered connector can
//! produce well-behaved and failing Clients side by side:
//!
//! | parameter          | effect                                   |
//! |--------------------|------------------------------------------|
//! | `kind`             | value reported by `Client::kind`         |
//! | `fail-init`        | `ConnectorFactory::init` fails           |
//! | `fail-connect`     | `connect` fails                          |
//! | `fail-disconnect`  | `disconnect` fails                       |
//! | `fail-destroy`     | `destroy` fails                          |
//! | `connection`       | value exposed through `Client::connection` |

use keystone_domain::{Named, Parameters, ProviderConfig, ServiceSpec, Value};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::connector::{Client, Connector, ConnectorError, ConnectorFactory, ServiceRef};
use crate::loader::{Loader, LoaderError};
use crate::plugin::{Output, PluginError, Service};
use crate::provider::{Object, Provider, ProviderError};

/// Default kind reported by [`MockClient`].
pub const MOCK_KIND: &str = "mock";

/// Shared, ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Entries starting with `prefix`.
    #[must_use]
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.0.lock().iter().filter(|e| e.starts_with(prefix)).cloned().collect()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

#[derive(Debug)]
pub struct MockClient {
    name: String,
    kind: String,
    connected: bool,
    destroyed: bool,
    fail_connect: bool,
    fail_disconnect: bool,
    fail_destroy: bool,
    connection: Option<Value>,
    journal: Journal,
}

impl MockClient {
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Option<&Parameters>, journal: Journal) -> Self {
        let flag = |key: &str| parameters.is_some_and(|p| p.flag(key));
        Self {
            name: name.into(),
            kind: parameters.and_then(|p| p.get_str("kind")).unwrap_or(MOCK_KIND).to_owned(),
            connected: false,
            destroyed: false,
            fail_connect: flag("fail-connect"),
            fail_disconnect: flag("fail-disconnect"),
            fail_destroy: flag("fail-destroy"),
            connection: parameters.and_then(|p| p.get("connection")).cloned(),
            journal,
        }
    }

    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Client for MockClient {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn connect(&mut self) -> Result<(), ConnectorError> {
        self.journal.record(format!("connect:{}", self.name));
        if self.fail_connect {
            return Err(ConnectorError::Connect {
                message: "injected connect failure".into(),
                context: None,
            });
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ConnectorError> {
        self.journal.record(format!("disconnect:{}", self.name));
        if self.fail_disconnect {
            return Err(ConnectorError::Disconnect {
                message: "injected disconnect failure".into(),
                context: None,
            });
        }
        self.connected = false;
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), ConnectorError> {
        self.journal.record(format!("destroy:{}", self.name));
        if self.fail_destroy {
            return Err(ConnectorError::Destroy {
                message: "injected destroy failure".into(),
                context: None,
            });
        }
        self.destroyed = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connection(&self) -> Option<Object> {
        if !self.connected {
            return None;
        }
        self.connection.clone().map(|value| Arc::new(value) as Object)
    }
}

#[derive(Debug)]
pub struct MockConnector {
    client: MockClient,
}

impl Connector for MockConnector {
    fn client_name(&self) -> &str {
        &self.client.name
    }

    fn client(&self) -> &dyn Client {
        &self.client
    }

    fn client_mut(&mut self) -> &mut dyn Client {
        &mut self.client
    }
}

/// Builds [`MockConnector`]s and journals every `init`.
#[derive(Debug, Clone, Default)]
pub struct MockConnectorFactory {
    pub journal: Journal,
}

impl MockConnectorFactory {
    #[must_use]
    pub const fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }
}

impl ConnectorFactory for MockConnectorFactory {
    fn init(
        &self,
        service: ServiceRef<'_>,
        client_name: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Box<dyn Connector>, ConnectorError> {
        self.journal.record(format!("init:{}/{}/{client_name}", service.scope, service.name));
        if parameters.is_some_and(|p| p.flag("fail-init")) {
            return Err(ConnectorError::Init {
                message: "injected init failure".into(),
                context: None,
            });
        }
        let client = MockClient::new(client_name, parameters, self.journal.clone());
        Ok(Box::new(MockConnector { client }))
    }
}

/// Service behaviour that records its configuration and echoes parameters back.
///
/// `echo` returns the operation parameters as a JSON object; `config` returns the applied
/// configuration object. Anything else falls through to the default `UnsupportedOperation`.
#[derive(Debug, Default)]
pub struct EchoService {
    name: String,
    config: Option<Value>,
    fail_shutdown: bool,
    journal: Journal,
}

impl EchoService {
    #[must_use]
    pub fn new(name: impl Into<String>, journal: Journal) -> Self {
        Self { name: name.into(), journal, ..Self::default() }
    }

    /// Factory for the catalog. A `fail-shutdown` parameter makes `shutdown` fail.
    #[must_use]
    pub fn factory() -> impl Fn(&ServiceSpec) -> Result<Box<dyn Service>, PluginError> + Send + Sync
    {
        Self::factory_with_journal(Journal::default())
    }

    #[must_use]
    pub fn factory_with_journal(
        journal: Journal,
    ) -> impl Fn(&ServiceSpec) -> Result<Box<dyn Service>, PluginError> + Send + Sync {
        move |spec: &ServiceSpec| {
            let mut service = Self::new(spec.name(), journal.clone());
            service.fail_shutdown = keystone_domain::Parameterized::parameters(spec)
                .is_some_and(|p| p.flag("fail-shutdown"));
            Ok(Box::new(service) as Box<dyn Service>)
        }
    }
}

impl Service for EchoService {
    fn configure(&mut self, config: &Value) -> Result<(), PluginError> {
        self.journal.record(format!("configure:{}", self.name));
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, operation: &str, parameters: &Parameters) -> Result<Output, PluginError> {
        match operation {
            "echo" => Ok(Output::Value(parameters.to_value())),
            "config" => Ok(self.config.clone().map_or(Output::Unit, Output::Value)),
            _ => Err(PluginError::UnsupportedOperation {
                message: operation.to_owned().into(),
                context: None,
            }),
        }
    }

    fn shutdown(&mut self) -> Result<(), PluginError> {
        self.journal.record(format!("shutdown:{}", self.name));
        if self.fail_shutdown {
            return Err(PluginError::Shutdown {
                message: "injected shutdown failure".into(),
                context: None,
            });
        }
        Ok(())
    }
}

/// Provider exposing its own parameters as objects (each value wrapped as a JSON `Value`).
#[derive(Debug, Default)]
pub struct MapProvider {
    objects: Vec<(String, Object)>,
}

impl MapProvider {
    #[must_use]
    pub fn new(objects: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            objects: objects
                .into_iter()
                .map(|(name, value)| (name, Arc::new(value) as Object))
                .collect(),
        }
    }

    /// Catalog factory building a provider from the record's parameters.
    ///
    /// # Errors
    /// Fails when the record carries a `fail-init` parameter.
    pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
        let parameters = keystone_domain::Parameterized::parameters(config);
        if parameters.is_some_and(|p| p.flag("fail-init")) {
            return Err(ProviderError::Init {
                message: "injected provider failure".into(),
                context: Some(config.name().to_owned().into()),
            });
        }
        let objects = parameters
            .map(|p| p.iter().map(|e| (e.name.clone(), e.value.clone())).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(Arc::new(Self::new(objects)))
    }
}

impl Provider for MapProvider {
    fn object(&self, name: &str) -> Option<Object> {
        self.objects.iter().rev().find(|(n, _)| n == name).map(|(_, o)| Arc::clone(o))
    }
}

/// Loader returning a fixed configuration object and journaling each call.
#[derive(Debug, Clone)]
pub struct StaticLoader {
    value: Option<Value>,
    fail: bool,
    pub journal: Journal,
}

impl StaticLoader {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value: Some(value), fail: false, journal: Journal::default() }
    }

    /// A loader that has nothing to offer.
    #[must_use]
    pub fn empty() -> Self {
        Self { value: None, fail: false, journal: Journal::default() }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self { value: None, fail: true, journal: Journal::default() }
    }
}

impl Loader for StaticLoader {
    fn load(
        &self,
        scope: &str,
        loader_id: &str,
        _parameters: Option<&Parameters>,
    ) -> Result<Option<Value>, LoaderError> {
        self.journal.record(format!("load:{scope}/{loader_id}"));
        if self.fail {
            return Err(LoaderError::Load {
                message: "injected loader failure".into(),
                context: None,
            });
        }
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_honours_injected_failures() {
        let journal = Journal::default();
        let params = Parameters::new().with("fail-disconnect", true).with("kind", "redis");
        let factory = MockConnectorFactory::with_journal(journal.clone());
        let mut connector = factory
            .init(ServiceRef { scope: "app", name: "db" }, "primary", Some(&params))
            .unwrap();

        assert_eq!(connector.client().kind(), "redis");
        connector.client_mut().connect().unwrap();
        assert!(connector.client_mut().disconnect().is_err());
        assert!(connector.client().is_connected());
        assert_eq!(journal.entries(), ["init:app/db/primary", "connect:primary", "disconnect:primary"]);
    }

    #[test]
    fn map_provider_serves_parameters() {
        let config = ProviderConfig::new("cache", "map")
            .with_parameters(Parameters::new().with("settings", serde_json::json!({"a": 1})));
        let provider = MapProvider::from_config(&config).unwrap();

        let object = provider.object("settings").unwrap();
        assert_eq!(object.downcast_ref::<Value>(), Some(&serde_json::json!({"a": 1})));
        assert!(provider.object("missing").is_none());
    }
}
