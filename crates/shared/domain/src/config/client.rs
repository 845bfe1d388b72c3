use serde::{Deserialize, Serialize};

use crate::named::Named;
use crate::parameters::{Parameterized, Parameters};

/// Declarative record for a Client owned by a Proxy Service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfig {
    #[serde(default)]
    name: String,
    /// Connector id resolved through the plugin catalog.
    pub connector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    #[serde(skip)]
    service: Option<String>,
}

impl ClientConfig {
    pub fn new(name: impl Into<String>, connector: impl Into<String>) -> Self {
        Self { name: name.into(), connector: connector.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        crate::named::collapse(&mut self.parameters);
        self
    }

    /// Name of the owning Proxy Service.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }
}

impl Named for ClientConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn set_owner(&mut self, owner: &str) {
        self.service = Some(owner.to_owned());
    }
}

impl Parameterized for ClientConfig {
    fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    fn parameters_slot(&mut self) -> &mut Option<Parameters> {
        &mut self.parameters
    }
}
