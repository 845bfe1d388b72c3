use serde::{Deserialize, Serialize};

use crate::named::Named;
use crate::parameters::{Parameterized, Parameters};

/// Declarative record for a Provider (object factory) living in a Scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderConfig {
    #[serde(default)]
    name: String,
    /// Implementation id resolved through the plugin catalog.
    pub implementation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    #[serde(skip)]
    scope: Option<String>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self { name: name.into(), implementation: implementation.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        crate::named::collapse(&mut self.parameters);
        self
    }

    /// Name of the owning Scope.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl Named for ProviderConfig {
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

impl Parameterized for ProviderConfig {
    fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    fn parameters_slot(&mut self) -> &mut Option<Parameters> {
        &mut self.parameters
    }
}
