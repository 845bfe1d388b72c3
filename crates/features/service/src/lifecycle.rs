//! Service lifecycle state machine.
//!
//! ```text
//! Uninitialized ──init──▶ Initializing ──configure──▶ Configured ──▶ Ready ──close──▶ Closed
//!        ▲                     │                                       ▲
//!        └──── init failed ────┘───────────── no configuration ────────┘
//! ```

use keystone_domain::{ConfigSource, Parameters, ServiceConfig, Value};
use keystone_kernel::{Output, PluginError, ScopeContext, Service};
use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceErrorExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Configured,
    Ready,
    Closed,
}

impl ServiceState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Configured => "configured",
            Self::Ready => "ready",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: ServiceState,
    name: String,
    scope: Option<String>,
    configured: bool,
    behaviour: Box<dyn Service>,
}

impl Lifecycle {
    fn label(&self) -> String {
        match &self.scope {
            Some(scope) => format!("service '{}' in scope '{scope}'", self.name),
            None => format!("service '{}'", self.name),
        }
    }

    fn transition(&mut self, next: ServiceState) {
        debug!(service = %self.name, from = %self.state, to = %next, "Service state transition");
        self.state = next;
    }

    fn require_live(&self, action: &str) -> Result<(), ServiceError> {
        if matches!(self.state, ServiceState::Ready | ServiceState::Configured) {
            return Ok(());
        }
        Err(ServiceError::InvalidState {
            message: format!("cannot {action} in state '{}'", self.state).into(),
            context: Some(self.label().into()),
        })
    }

    fn configure(&mut self, config: &Value) -> Result<(), ServiceError> {
        if self.configured {
            return Err(ServiceError::InvalidState {
                message: "configuration already applied".into(),
                context: Some(self.label().into()),
            });
        }
        let label = self.label();
        self.behaviour.configure(config).context(label)?;
        self.configured = true;
        Ok(())
    }

    fn resolve_config(
        &mut self,
        scope: &dyn ScopeContext,
        parameters: Option<&Parameters>,
    ) -> Result<(), ServiceError> {
        let Some(source) = ConfigSource::from_parameters(parameters) else {
            debug!(service = %self.name, "No configuration source; service stays unconfigured");
            return Ok(());
        };

        let config = match source {
            ConfigSource::Loader(id) => {
                let loader = scope.loader(&id).ok_or_else(|| ServiceError::UnknownLoader {
                    message: id.clone().into(),
                    context: Some(self.label().into()),
                })?;
                loader.load(scope.scope_name(), &id, parameters).context(self.label())?
            },
            ConfigSource::Target(value) => Some(value),
            ConfigSource::SelfRecord => Some(ServiceConfig::self_record_of(&self.name, parameters)),
            ConfigSource::Malformed(key) => {
                return Err(ServiceError::InvalidParameter {
                    message: key.into(),
                    context: Some(self.label().into()),
                });
            },
        };

        match config {
            Some(config) => {
                self.configure(&config)?;
                self.transition(ServiceState::Configured);
            },
            None => debug!(service = %self.name, "Loader returned nothing; service stays unconfigured"),
        }
        Ok(())
    }
}

/// A live Service: one behaviour plugin driven through the lifecycle state machine.
///
/// All calls are serialized through one lock per instance.
#[derive(Debug)]
pub struct ServiceInstance {
    inner: Mutex<Lifecycle>,
}

impl ServiceInstance {
    #[must_use]
    pub fn new(behaviour: Box<dyn Service>) -> Self {
        Self {
            inner: Mutex::new(Lifecycle {
                state: ServiceState::Uninitialized,
                name: String::new(),
                scope: None,
                configured: false,
                behaviour,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.inner.lock().state
    }

    /// Name given at `init`; empty before the first successful `init` call.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    #[must_use]
    pub fn scope_name(&self) -> Option<String> {
        self.inner.lock().scope.clone()
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.lock().configured
    }

    /// Initializes the Service inside `scope` and applies its configuration object.
    ///
    /// The configuration strategy follows the parameters: a `config-class` Loader id is looked
    /// up through the Scope and invoked with the same parameters; otherwise a `config-target`
    /// object is applied unchanged; with neither the Service stays unconfigured.
    ///
    /// # Errors
    /// * [`ServiceError::InvalidConfiguration`] when `scope` is absent or `name` is empty.
    /// * [`ServiceError::InvalidState`] when the instance is not `Uninitialized`.
    /// * Loader and behaviour failures; the instance returns to `Uninitialized`.
    pub fn init(
        &self,
        scope: Option<&dyn ScopeContext>,
        name: &str,
        parameters: Option<&Parameters>,
    ) -> Result<(), ServiceError> {
        let Some(scope) = scope else {
            return Err(ServiceError::InvalidConfiguration {
                message: "scope is required".into(),
                context: Some(format!("service '{name}'").into()),
            });
        };
        if name.is_empty() {
            return Err(ServiceError::InvalidConfiguration {
                message: "service name is empty".into(),
                context: Some(format!("scope '{}'", scope.scope_name()).into()),
            });
        }

        let mut inner = self.inner.lock();
        if inner.state != ServiceState::Uninitialized {
            return Err(ServiceError::InvalidState {
                message: format!("cannot init from state '{}'", inner.state).into(),
                context: Some(inner.label().into()),
            });
        }

        inner.name = name.to_owned();
        inner.scope = Some(scope.scope_name().to_owned());
        inner.transition(ServiceState::Initializing);

        if let Err(err) = inner.resolve_config(scope, parameters) {
            warn!(service = %name, error = %err, "Service init failed");
            inner.configured = false;
            inner.transition(ServiceState::Uninitialized);
            return Err(err);
        }

        inner.transition(ServiceState::Ready);
        Ok(())
    }

    /// Applies a configuration object directly. Runs at most once per lifecycle.
    ///
    /// # Errors
    /// [`ServiceError::InvalidState`] on a second call, before `init`, or after `close`.
    pub fn configure(&self, config: &Value) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock();
        if !matches!(inner.state, ServiceState::Ready) {
            return Err(ServiceError::InvalidState {
                message: format!("cannot configure in state '{}'", inner.state).into(),
                context: Some(inner.label().into()),
            });
        }
        inner.configure(config)
    }

    /// Forwards an operation to the behaviour.
    ///
    /// # Errors
    /// [`ServiceError::UnsupportedOperation`] when the behaviour does not know `operation`;
    /// [`ServiceError::InvalidState`] before `init` or after `close`.
    pub fn execute(&self, operation: &str, parameters: &Parameters) -> Result<Output, ServiceError> {
        let mut inner = self.inner.lock();
        inner.require_live(&format!("execute '{operation}'"))?;
        match inner.behaviour.execute(operation, parameters) {
            Ok(output) => Ok(output),
            Err(PluginError::UnsupportedOperation { message, .. }) => {
                Err(ServiceError::UnsupportedOperation { message, context: Some(inner.label().into()) })
            },
            Err(source) => Err(ServiceError::Plugin { source, context: Some(inner.label().into()) }),
        }
    }

    /// Runs the shutdown hook and moves to `Closed`.
    ///
    /// Closing a closed Service is a logged no-op. A failing hook leaves the state untouched.
    ///
    /// # Errors
    /// [`ServiceError::InvalidState`] before `init`; otherwise the behaviour's shutdown failure.
    pub fn close(&self) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock();
        if inner.state == ServiceState::Closed {
            warn!(service = %inner.name, "Service already closed");
            return Ok(());
        }
        inner.require_live("close")?;
        let label = inner.label();
        inner.behaviour.shutdown().context(label)?;
        inner.transition(ServiceState::Closed);
        Ok(())
    }
}
