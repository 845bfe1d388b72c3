use serde::{Deserialize, Serialize};

use crate::named::Named;

/// Named handle into a Provider's object catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectReferenceConfig {
    #[serde(default)]
    name: String,
    /// Provider name, resolved through the Scope chain.
    pub provider: String,
    /// Object name inside the Provider.
    pub object: String,
    #[serde(skip)]
    scope: Option<String>,
}

impl ObjectReferenceConfig {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), provider: provider.into(), object: object.into(), scope: None }
    }

    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl Named for ObjectReferenceConfig {
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
