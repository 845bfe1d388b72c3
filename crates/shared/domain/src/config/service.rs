use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ClientConfig;
use crate::constants::{CONFIG_CLASS, CONFIG_TARGET, SELF_TARGET};
use crate::named::{self, Named, NamedMap};
use crate::parameters::{Parameterized, Parameters, Value};

/// How a Service obtains its configuration object at init time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Ask the Loader registered under this id.
    Loader(String),
    /// Apply this pre-built object unchanged.
    Target(Value),
    /// The Service record itself is the configuration object.
    SelfRecord,
    /// The named parameter is present but carries a value of the wrong shape.
    Malformed(&'static str),
}

impl ConfigSource {
    /// Classifies `parameters`: `CONFIG_CLASS` wins over `CONFIG_TARGET`; neither means `None`.
    #[must_use]
    pub fn from_parameters(parameters: Option<&Parameters>) -> Option<Self> {
        let parameters = parameters?;
        if let Some(class) = parameters.get(CONFIG_CLASS) {
            return Some(match class.as_str() {
                Some(id) if !id.is_empty() => Self::Loader(id.to_owned()),
                _ => Self::Malformed(CONFIG_CLASS),
            });
        }
        parameters.get(CONFIG_TARGET).map(|target| match target.as_str() {
            Some(SELF_TARGET) => Self::SelfRecord,
            _ => Self::Target(target.clone()),
        })
    }
}

/// Declarative record for a plain Service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceConfig {
    #[serde(default)]
    name: String,
    /// Implementation id resolved through the plugin catalog.
    pub implementation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    #[serde(skip)]
    scope: Option<String>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self { name: name.into(), implementation: implementation.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        named::collapse(&mut self.parameters);
        self
    }

    /// Name of the owning Scope.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    #[must_use]
    pub fn config_source(&self) -> Option<ConfigSource> {
        ConfigSource::from_parameters(self.parameters.as_ref())
    }

    /// The record as a configuration object, without its self-referential target.
    #[must_use]
    pub fn self_record(&self) -> Value {
        Self::self_record_of(&self.name, self.parameters.as_ref())
    }

    /// Configuration object for a Service named `name` whose target points at its own record.
    #[must_use]
    pub fn self_record_of(name: &str, parameters: Option<&Parameters>) -> Value {
        let mut parameters = parameters.cloned().unwrap_or_default();
        parameters.remove(CONFIG_TARGET);
        json!({ "name": name, "parameters": parameters.to_value() })
    }

    /// Parameters to hand to the lifecycle, with a self-referential target swapped for the record.
    #[must_use]
    pub fn init_parameters(&self) -> Option<Parameters> {
        let mut parameters = self.parameters.clone()?;
        if matches!(self.config_source(), Some(ConfigSource::SelfRecord)) {
            parameters.set(CONFIG_TARGET, self.self_record());
        }
        Some(parameters)
    }

    /// One-way transition into a Proxy Service record.
    ///
    /// Name, implementation, owner and parameters carry over; a self-referential
    /// `CONFIG_TARGET` is dropped because the record it pointed at no longer exists.
    #[must_use]
    pub fn promote(mut self) -> ProxyServiceConfig {
        if matches!(self.config_source(), Some(ConfigSource::SelfRecord)) {
            self.remove_parameter(CONFIG_TARGET);
        }
        ProxyServiceConfig { service: self, clients: None }
    }
}

impl Named for ServiceConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn set_owner(&mut self, owner: &str) {
        self.scope = Some(owner.to_owned());
    }
}

impl Parameterized for ServiceConfig {
    fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    fn parameters_slot(&mut self) -> &mut Option<Parameters> {
        &mut self.parameters
    }
}

/// A Service record that additionally owns named Client records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyServiceConfig {
    service: ServiceConfig,
    clients: Option<NamedMap<ClientConfig>>,
}

impl ProxyServiceConfig {
    pub fn new(name: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self { service: ServiceConfig::new(name, implementation), clients: None }
    }

    #[must_use]
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.add_client(client);
        self
    }

    /// The underlying Service record.
    #[must_use]
    pub const fn service(&self) -> &ServiceConfig {
        &self.service
    }

    pub const fn service_mut(&mut self) -> &mut ServiceConfig {
        &mut self.service
    }

    #[must_use]
    pub const fn clients(&self) -> Option<&NamedMap<ClientConfig>> {
        self.clients.as_ref()
    }

    #[must_use]
    pub fn client(&self, name: &str) -> Option<&ClientConfig> {
        self.clients.as_ref().and_then(|c| c.get(name))
    }

    #[must_use]
    pub fn client_names(&self) -> Vec<&str> {
        self.clients.as_ref().map(NamedMap::names).unwrap_or_default()
    }

    /// Adds or replaces a Client record, stamping this Service as its owner.
    pub fn add_client(&mut self, mut client: ClientConfig) -> Option<ClientConfig> {
        client.set_owner(&self.service.name);
        named::insert_into(&mut self.clients, client)
    }

    pub fn remove_client(&mut self, name: &str) -> Option<ClientConfig> {
        named::remove_from(&mut self.clients, name)
    }

    fn reparent(&mut self) {
        if let Some(clients) = &mut self.clients {
            clients.set_owner(&self.service.name);
        }
    }
}

impl From<ServiceConfig> for ProxyServiceConfig {
    fn from(service: ServiceConfig) -> Self {
        service.promote()
    }
}

impl Named for ProxyServiceConfig {
    fn name(&self) -> &str {
        &self.service.name
    }

    fn set_name(&mut self, name: String) {
        self.service.name = name;
        self.reparent();
    }

    fn set_owner(&mut self, owner: &str) {
        self.service.set_owner(owner);
    }
}

impl Parameterized for ProxyServiceConfig {
    fn parameters(&self) -> Option<&Parameters> {
        self.service.parameters.as_ref()
    }

    fn parameters_slot(&mut self) -> &mut Option<Parameters> {
        &mut self.service.parameters
    }
}

/// A Service registration: either a plain Service or a Proxy Service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ServiceRecord", into = "ServiceRecord")]
pub enum ServiceSpec {
    Plain(ServiceConfig),
    Proxy(ProxyServiceConfig),
}

impl ServiceSpec {
    #[must_use]
    pub const fn service(&self) -> &ServiceConfig {
        match self {
            Self::Plain(service) => service,
            Self::Proxy(proxy) => &proxy.service,
        }
    }

    #[must_use]
    pub fn implementation(&self) -> &str {
        &self.service().implementation
    }

    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.service().scope()
    }

    #[must_use]
    pub const fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    #[must_use]
    pub const fn as_proxy(&self) -> Option<&ProxyServiceConfig> {
        match self {
            Self::Proxy(proxy) => Some(proxy),
            Self::Plain(_) => None,
        }
    }

    pub const fn as_proxy_mut(&mut self) -> Option<&mut ProxyServiceConfig> {
        match self {
            Self::Proxy(proxy) => Some(proxy),
            Self::Plain(_) => None,
        }
    }

    /// Returns the Proxy form; already-promoted registrations are returned unchanged.
    #[must_use]
    pub fn promote(self) -> Self {
        match self {
            Self::Plain(service) => Self::Proxy(service.promote()),
            proxy @ Self::Proxy(_) => proxy,
        }
    }

    #[must_use]
    pub fn config_source(&self) -> Option<ConfigSource> {
        self.service().config_source()
    }

    #[must_use]
    pub fn init_parameters(&self) -> Option<Parameters> {
        self.service().init_parameters()
    }
}

impl From<ServiceConfig> for ServiceSpec {
    fn from(service: ServiceConfig) -> Self {
        Self::Plain(service)
    }
}

impl From<ProxyServiceConfig> for ServiceSpec {
    fn from(proxy: ProxyServiceConfig) -> Self {
        Self::Proxy(proxy)
    }
}

impl Named for ServiceSpec {
    fn name(&self) -> &str {
        &self.service().name
    }

    fn set_name(&mut self, name: String) {
        match self {
            Self::Plain(service) => service.set_name(name),
            Self::Proxy(proxy) => proxy.set_name(name),
        }
    }

    fn set_owner(&mut self, owner: &str) {
        match self {
            Self::Plain(service) => service.set_owner(owner),
            Self::Proxy(proxy) => proxy.set_owner(owner),
        }
    }
}

impl Parameterized for ServiceSpec {
    fn parameters(&self) -> Option<&Parameters> {
        self.service().parameters.as_ref()
    }

    fn parameters_slot(&mut self) -> &mut Option<Parameters> {
        match self {
            Self::Plain(service) => &mut service.parameters,
            Self::Proxy(proxy) => &mut proxy.service.parameters,
        }
    }
}

/// Wire shape shared by both registration kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ServiceRecord {
    #[serde(default)]
    name: String,
    implementation: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    proxy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clients: Option<NamedMap<ClientConfig>>,
}

impl From<ServiceRecord> for ServiceSpec {
    fn from(record: ServiceRecord) -> Self {
        let is_proxy = record.proxy || record.clients.is_some();
        let mut service = ServiceConfig::new(record.name, record.implementation);
        service.parameters = record.parameters;
        named::collapse(&mut service.parameters);

        if !is_proxy {
            return Self::Plain(service);
        }
        let mut proxy = ProxyServiceConfig { service, clients: record.clients };
        named::collapse(&mut proxy.clients);
        proxy.reparent();
        Self::Proxy(proxy)
    }
}

impl From<ServiceSpec> for ServiceRecord {
    fn from(spec: ServiceSpec) -> Self {
        match spec {
            ServiceSpec::Plain(service) => Self {
                name: service.name,
                implementation: service.implementation,
                proxy: false,
                parameters: service.parameters,
                clients: None,
            },
            ServiceSpec::Proxy(proxy) => Self {
                name: proxy.service.name,
                implementation: proxy.service.implementation,
                proxy: true,
                parameters: proxy.service.parameters,
                clients: proxy.clients,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_class_takes_precedence_over_target() {
        let params = Parameters::new().with(CONFIG_TARGET, json!({"a": 1})).with(CONFIG_CLASS, "file");
        assert_eq!(
            ConfigSource::from_parameters(Some(&params)),
            Some(ConfigSource::Loader("file".to_owned()))
        );

        let params = Parameters::new().with(CONFIG_CLASS, 7);
        assert_eq!(
            ConfigSource::from_parameters(Some(&params)),
            Some(ConfigSource::Malformed(CONFIG_CLASS))
        );
        assert_eq!(ConfigSource::from_parameters(None), None);
    }

    #[test]
    fn promote_drops_self_target_only() {
        let service = ServiceConfig::new("db", "pool")
            .with_parameters(Parameters::new().with(CONFIG_TARGET, SELF_TARGET).with("size", 4));
        let proxy = service.promote();

        assert_eq!(proxy.name(), "db");
        assert_eq!(proxy.service().implementation, "pool");
        assert_eq!(proxy.parameter("size"), Some(&json!(4)));
        assert!(proxy.parameter(CONFIG_TARGET).is_none());

        let target = json!({"url": "x"});
        let service = ServiceConfig::new("db", "pool")
            .with_parameters(Parameters::new().with(CONFIG_TARGET, target.clone()));
        assert_eq!(service.promote().parameter(CONFIG_TARGET), Some(&target));
    }

    #[test]
    fn promote_collapses_emptied_parameters() {
        let service = ServiceConfig::new("db", "pool")
            .with_parameters(Parameters::new().with(CONFIG_TARGET, SELF_TARGET));
        assert!(!service.promote().has_parameters());
    }

    #[test]
    fn init_parameters_resolve_self_record() {
        let service = ServiceConfig::new("db", "pool")
            .with_parameters(Parameters::new().with(CONFIG_TARGET, SELF_TARGET).with("size", 4));
        let params = service.init_parameters().unwrap();

        assert_eq!(
            params.get(CONFIG_TARGET),
            Some(&json!({"name": "db", "parameters": {"size": 4}}))
        );
    }

    #[test]
    fn spec_deserializes_proxy_from_clients_or_flag() {
        let plain: ServiceSpec = serde_json::from_value(json!({"implementation": "echo"})).unwrap();
        assert!(!plain.is_proxy());

        let flagged: ServiceSpec =
            serde_json::from_value(json!({"implementation": "echo", "proxy": true})).unwrap();
        assert!(flagged.is_proxy());
        assert!(flagged.as_proxy().and_then(ProxyServiceConfig::clients).is_none());

        let mut with_clients: ServiceSpec = serde_json::from_value(json!({
            "implementation": "echo",
            "clients": { "primary": { "connector": "mock" } }
        }))
        .unwrap();
        with_clients.set_name("svc".to_owned());

        let proxy = with_clients.as_proxy().unwrap();
        let client = proxy.client("primary").unwrap();
        assert_eq!(client.connector, "mock");
        assert_eq!(client.service(), Some("svc"));
    }

    #[test]
    fn add_client_stamps_owner() {
        let mut proxy = ProxyServiceConfig::new("svc", "echo");
        proxy.add_client(ClientConfig::new("a", "mock"));
        assert_eq!(proxy.client("a").and_then(ClientConfig::service), Some("svc"));

        proxy.remove_client("a");
        assert!(proxy.clients().is_none());
    }
}
