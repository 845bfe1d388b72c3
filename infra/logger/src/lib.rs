//! # Logger
//!
//! Global tracing subscriber setup for processes hosting a container.
//! It provides a unified way to configure console and file logging with
//! rotation, non-blocking I/O, and environment-based filtering.
//!
//! * [`LoggerConfig`] is `serde`-deserializable, so the logging section can live in the same
//!   configuration file as the Scopes it hosts. Use [`Logger::from_config`] for that path.
//! * [`Logger::builder`] is the programmatic path; the builder refuses file-only options until a
//!   path has been given.
//! * Use [`LoggerBuilder::env_filter`] to set module-directed filters
//!   (e.g., `"keystone_scope=trace,keystone_service=debug"`), in addition to `RUST_LOG`.
//!
//! ## Example
//!
//! ```rust
//! # use keystone_logger::{Logger, LevelFilter};
//!
//! let _logger = Logger::builder()
//!     .name("my-app")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_NAME: &str = "keystone";
const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// File rotation policy, as written in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

/// Logging section of a host configuration file.
///
/// ```toml
/// [logger]
/// name = "app"
/// level = "debug"
/// path = "logs"
/// rotation = "hourly"
/// json = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggerConfig {
    /// Identifier of the process; prefixes rolling log files.
    pub name: String,
    pub console: bool,
    /// Directory for rolling log files. No file output when absent.
    pub path: Option<PathBuf>,
    /// Default level directive (`trace`, `debug`, `info`, `warn`, `error`, `off`).
    pub level: String,
    pub rotation: LogRotation,
    pub max_files: usize,
    /// Emit JSON lines into the log files.
    pub json: bool,
    pub env_filter: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            console: true,
            path: None,
            level: LevelFilter::INFO.to_string(),
            rotation: LogRotation::Daily,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName;
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// A builder for configuring and initializing the global tracing subscriber.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    config: LoggerConfig,
    state: std::marker::PhantomData<(N, F)>,
}

impl<N: Sealed, F: Sealed> LoggerBuilder<N, F> {
    const fn transition<N2: Sealed, F2: Sealed>(config: LoggerConfig) -> LoggerBuilder<N2, F2> {
        LoggerBuilder { config, state: std::marker::PhantomData }
    }
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Sets the name of the logger.
    pub fn name(mut self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        self.config.name = name.into();
        Self::transition(self.config)
    }
}

impl LoggerBuilder<WithName, WithFile> {
    /// Configures maximum number of log files to keep.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    /// Configures the log file rotation strategy.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: LogRotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Enables JSON logging.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self) -> Self {
        self.config.json = true;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    /// Configures the minimum log level to be emitted.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level.to_string();
        self
    }

    /// Adds an explicit env filter (e.g., `keystone_scope=trace`).
    ///
    /// Environment variables still override via `RUST_LOG`; this is a programmatic default.
    /// Invalid filters will cause [`LoggerBuilder::init`] to return an error.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    /// Enables console logging.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Sets the path to log files.
    pub fn path(mut self, path: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        self.config.path = Some(path.into());
        Self::transition(self.config)
    }

    /// Consumes the builder and initializes the global tracing subscriber.
    ///
    /// # Returns
    /// A [`Logger`] handle. **Note:** This handle contains a [`WorkerGuard`]
    /// that must be kept alive for the duration of the program to ensure
    /// that non-blocking logs are flushed correctly.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber has already been set.
    /// Returns [`LoggerError::InvalidConfiguration`] for invalid builder settings.
    pub fn init(self) -> Result<Logger, LoggerError> {
        install(self.config)
    }
}

/// A handle to the initialized logging system.
///
/// This struct holds the background worker guards. Drop this struct only
/// when the application is shutting down.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`] to configure the global tracing subscriber.
    ///
    /// The `name` serves as the primary identifier for your logs and is used
    /// as a prefix for rolling log files (e.g., `my-app.2023-10-27.log`).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), state: std::marker::PhantomData }
    }

    /// Initializes the global subscriber from a deserialized [`LoggerConfig`].
    ///
    /// # Errors
    /// Same as [`LoggerBuilder::init`].
    pub fn from_config(config: &LoggerConfig) -> Result<Self, LoggerError> {
        install(config.clone())
    }

    /// Manually triggers a flush of all pending logs in the non-blocking worker.
    ///
    /// While flushing happens automatically when this handle is dropped, this
    /// method acts as a best-effort synchronization point before shutdown.
    pub fn flush(&self) {
        tracing::debug!("Logger flushed");
    }

    /// Returns a reference to the underlying worker guard, if present.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn install(config: LoggerConfig) -> Result<Logger, LoggerError> {
    validate_config(&config)?;

    let env_filter = build_env_filter(&config)?;

    let mut layers = Vec::new();

    if config.console {
        layers.push(layer().compact().with_ansi(true).boxed());
    }

    let guard = if let Some(path) = config.path {
        fs::create_dir_all(&path).map_err(|e| LoggerError::Internal {
            message: e.to_string().into(),
            context: Some(format!("Failed to create path: {}", path.display()).into()),
        })?;

        let file_appender = RollingFileAppender::builder()
            .rotation(config.rotation.into())
            .filename_prefix(&config.name)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(config.max_files)
            .build(path)?;

        let (non_blocking, g) = tracing_appender::non_blocking(file_appender);

        let file_layer = layer().with_writer(non_blocking).with_ansi(false);

        let boxed = if config.json { file_layer.json().boxed() } else { file_layer.boxed() };

        layers.push(boxed);
        Some(g)
    } else {
        None
    };

    if layers.is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "No logging layers enabled. Enable console or file output.".into(),
            context: None,
        });
    }

    tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;

    Ok(Logger { guard })
}

fn validate_config(config: &LoggerConfig) -> Result<(), LoggerError> {
    if config.name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }

    if config.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }

    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    level.parse::<LevelFilter>().map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("Invalid level '{level}': {e}").into(),
        context: None,
    })
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(parse_level(&config.level)?.into());
    config.env_filter.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |filter| {
            builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{filter}': {e}").into(),
                context: None,
            })
        },
    )
}
