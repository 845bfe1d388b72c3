//! Facade crate for the Keystone container.
//! Re-exports the config model, kernel contracts, Scopes and Services, and bootstraps a
//! [`ScopeRegistry`] from configuration files.
//! Keep this crate thin: it should compose other crates, not implement container logic.
//!
//! ## Usage
//! ```rust,no_run
//! use keystone::Keystone;
//! use keystone::kernel::Catalog;
//!
//! let catalog = Catalog::new();
//! // catalog.register_service("postgres", ...);
//! let keystone = Keystone::builder()
//!     .catalog(catalog)
//!     .scope_file("config/root.toml")
//!     .scope_file("config/app.toml")
//!     .build()
//!     .unwrap();
//!
//! let app = keystone.scope("app").unwrap();
//! let _db = app.get_service("db").unwrap();
//! keystone.shutdown().unwrap();
//! ```

mod error;

/// Everything a host needs to wire plugins and drive Scopes.
pub mod prelude {
    pub use crate::{Keystone, KeystoneError, Scope, ScopeRegistry, ServiceHandle};
    pub use keystone_domain::{ClientConfig, ProviderConfig, ScopeConfig, ServiceConfig};
    pub use keystone_kernel::prelude::*;
}

pub use crate::error::{KeystoneError, KeystoneErrorExt};
pub use keystone_domain as domain;
pub use keystone_kernel as kernel;
pub use keystone_logger as logger;
pub use keystone_scope::{Scope, ScopeError, ScopeRegistry};
pub use keystone_service::{
    Operation, ProxyService, ServiceError, ServiceHandle, ServiceInstance, ServiceState, dispatch,
};

use keystone_domain::{Named, ScopeConfig};
use keystone_kernel::Catalog;
use keystone_kernel::config::{FILE_LOADER_ID, FileLoader, load_scope_config};
use keystone_logger::{Logger, LoggerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
enum ScopeSource {
    File(PathBuf),
    Config(ScopeConfig),
}

/// Builder for [`Keystone`]. Scope sources are registered in the order they were added.
#[derive(Debug, Default)]
pub struct KeystoneBuilder {
    catalog: Option<Catalog>,
    logger: Option<LoggerConfig>,
    config_dir: Option<PathBuf>,
    sources: Vec<ScopeSource>,
}

impl KeystoneBuilder {
    #[must_use]
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Installs the global tracing subscriber from `config` during [`Self::build`].
    #[must_use]
    pub fn logger(mut self, config: LoggerConfig) -> Self {
        self.logger = Some(config);
        self
    }

    /// Base directory for relative `config-path` parameters read by the file Loader.
    #[must_use]
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn scope_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ScopeSource::File(path.into()));
        self
    }

    #[must_use]
    pub fn scope(mut self, config: ScopeConfig) -> Self {
        self.sources.push(ScopeSource::Config(config));
        self
    }

    /// Builds the registry and registers every Scope source.
    ///
    /// The file Loader is registered as `"file"` unless the catalog already holds a Loader
    /// under that id.
    ///
    /// # Errors
    /// Logger installation, file loading and Scope registration failures.
    pub fn build(self) -> Result<Keystone, KeystoneError> {
        let logger = self.logger.as_ref().map(Logger::from_config).transpose()?;

        let catalog = self.catalog.unwrap_or_default();
        if catalog.loader(FILE_LOADER_ID).is_none() {
            let loader = self.config_dir.map_or_else(FileLoader::new, FileLoader::with_base_dir);
            catalog.register_loader(FILE_LOADER_ID, loader);
        }

        let registry = ScopeRegistry::new(catalog);
        for source in self.sources {
            let config = match source {
                ScopeSource::File(path) => {
                    let label = format!("scope file '{}'", path.display());
                    load_scope_config(&path).context(label)?
                },
                ScopeSource::Config(config) => config,
            };
            let scope = registry.register(&config).context(format!("scope '{}'", config.name()))?;
            info!(scope = %scope.name(), "Scope loaded");
        }

        Ok(Keystone { registry, logger })
    }
}

/// A bootstrapped container: the Scope registry plus the logger guard keeping file output alive.
#[derive(Debug)]
pub struct Keystone {
    registry: ScopeRegistry,
    logger: Option<Logger>,
}

impl Keystone {
    #[must_use]
    pub fn builder() -> KeystoneBuilder {
        KeystoneBuilder::default()
    }

    #[must_use]
    pub const fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.registry.catalog()
    }

    #[must_use]
    pub fn scope(&self, name: &str) -> Option<Arc<Scope>> {
        self.registry.get(name)
    }

    /// Tears every Scope down and flushes the logger.
    ///
    /// # Errors
    /// The first Scope teardown failure.
    pub fn shutdown(self) -> Result<(), KeystoneError> {
        let result = self.registry.teardown_all();
        if let Err(err) = &result {
            warn!(error = %err, "Container shutdown incomplete");
        }
        if let Some(logger) = &self.logger {
            logger.flush();
        }
        result.context("shutdown")
    }
}
