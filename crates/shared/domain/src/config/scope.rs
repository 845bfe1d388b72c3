use serde::{Deserialize, Serialize};

use crate::config::{ObjectReferenceConfig, ProviderConfig, ServiceSpec};
use crate::named::{self, Named, NamedMap};
use crate::parameters::{Parameterized, Parameters};

/// Declarative record for a Scope and everything it holds.
///
/// `parent` is an upward reference by name. `scopes` is this Scope's context: the child Scopes for
/// which it acts as domain. `domain` is the inverse link, stamped when the record is placed into a
/// context and never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScopeConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(skip)]
    domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    providers: Option<NamedMap<ProviderConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    services: Option<NamedMap<ServiceSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    object_references: Option<NamedMap<ObjectReferenceConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "context")]
    scopes: Option<NamedMap<Self>>,
}

impl ScopeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.add_provider(provider);
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: impl Into<ServiceSpec>) -> Self {
        self.add_service(service);
        self
    }

    #[must_use]
    pub fn with_object_reference(mut self, reference: ObjectReferenceConfig) -> Self {
        self.add_object_reference(reference);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Self) -> Self {
        self.add_scope(scope);
        self
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }

    /// Name of the Scope holding this one in its context.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn set_domain(&mut self, domain: Option<String>) {
        self.domain = domain;
    }

    // Providers

    #[must_use]
    pub const fn providers(&self) -> Option<&NamedMap<ProviderConfig>> {
        self.providers.as_ref()
    }

    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.as_ref().and_then(|p| p.get(name))
    }

    pub fn add_provider(&mut self, mut provider: ProviderConfig) -> Option<ProviderConfig> {
        provider.set_owner(&self.name);
        named::insert_into(&mut self.providers, provider)
    }

    pub fn remove_provider(&mut self, name: &str) -> Option<ProviderConfig> {
        named::remove_from(&mut self.providers, name)
    }

    // Services

    #[must_use]
    pub const fn services(&self) -> Option<&NamedMap<ServiceSpec>> {
        self.services.as_ref()
    }

    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.as_ref().and_then(|s| s.get(name))
    }

    pub fn service_mut(&mut self, name: &str) -> Option<&mut ServiceSpec> {
        self.services.as_mut().and_then(|s| s.get_mut(name))
    }

    pub fn add_service(&mut self, service: impl Into<ServiceSpec>) -> Option<ServiceSpec> {
        let mut service = service.into();
        service.set_owner(&self.name);
        named::insert_into(&mut self.services, service)
    }

    pub fn remove_service(&mut self, name: &str) -> Option<ServiceSpec> {
        named::remove_from(&mut self.services, name)
    }

    /// Replaces the registration `name` with its Proxy form, keeping its position.
    ///
    /// Returns `false` when no Service of that name is registered here.
    pub fn promote_service(&mut self, name: &str) -> bool {
        self.services.as_mut().is_some_and(|services| services.update(name, ServiceSpec::promote))
    }

    // Object references

    #[must_use]
    pub const fn object_references(&self) -> Option<&NamedMap<ObjectReferenceConfig>> {
        self.object_references.as_ref()
    }

    #[must_use]
    pub fn object_reference(&self, name: &str) -> Option<&ObjectReferenceConfig> {
        self.object_references.as_ref().and_then(|r| r.get(name))
    }

    pub fn add_object_reference(
        &mut self,
        mut reference: ObjectReferenceConfig,
    ) -> Option<ObjectReferenceConfig> {
        reference.set_owner(&self.name);
        named::insert_into(&mut self.object_references, reference)
    }

    pub fn remove_object_reference(&mut self, name: &str) -> Option<ObjectReferenceConfig> {
        named::remove_from(&mut self.object_references, name)
    }

    // Context (child scopes)

    #[must_use]
    pub const fn scopes(&self) -> Option<&NamedMap<Self>> {
        self.scopes.as_ref()
    }

    #[must_use]
    pub fn scope(&self, name: &str) -> Option<&Self> {
        self.scopes.as_ref().and_then(|s| s.get(name))
    }

    /// Places `scope` into this Scope's context, stamping this Scope as its domain.
    pub fn add_scope(&mut self, mut scope: Self) -> Option<Self> {
        scope.set_owner(&self.name);
        named::insert_into(&mut self.scopes, scope)
    }

    pub fn remove_scope(&mut self, name: &str) -> Option<Self> {
        named::remove_from(&mut self.scopes, name)
    }

    /// Structural merge of `source` into `self`.
    ///
    /// A non-empty `name` and a present `parent` overwrite. Parameters merge entry by entry.
    /// Providers, Services, Object References and child Scopes are copied one by one and
    /// re-parented to `self`; a record with an existing name replaces it.
    pub fn update(&mut self, source: &Self) {
        if !source.name.is_empty() {
            self.name.clone_from(&source.name);
        }
        if source.parent.is_some() {
            self.parent.clone_from(&source.parent);
        }
        if let Some(parameters) = &source.parameters {
            self.parameters.get_or_insert_with(Parameters::new).extend_from(parameters);
            named::collapse(&mut self.parameters);
        }
        for provider in source.providers.iter().flatten() {
            self.add_provider(provider.clone());
        }
        for service in source.services.iter().flatten() {
            self.add_service(service.clone());
        }
        for reference in source.object_references.iter().flatten() {
            self.add_object_reference(reference.clone());
        }
        for scope in source.scopes.iter().flatten() {
            self.add_scope(scope.clone());
        }
        self.reparent();
    }

    /// Restamps this Scope's name onto everything it owns.
    pub fn reparent(&mut self) {
        let owner = self.name.clone();
        if let Some(providers) = &mut self.providers {
            providers.set_owner(&owner);
        }
        if let Some(services) = &mut self.services {
            services.set_owner(&owner);
        }
        if let Some(references) = &mut self.object_references {
            references.set_owner(&owner);
        }
        if let Some(scopes) = &mut self.scopes {
            scopes.set_owner(&owner);
        }
    }
}

impl Named for ScopeConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
        self.reparent();
    }

    fn set_owner(&mut self, owner: &str) {
        self.domain = Some(owner.to_owned());
    }
}

impl Parameterized for ScopeConfig {
    fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    fn parameters_slot(&mut self) -> &mut Option<Parameters> {
        &mut self.parameters
    }
}
