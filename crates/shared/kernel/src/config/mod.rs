use config::{Config, Environment, File};
use keystone_domain::{Named, ScopeConfig};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

mod file;

pub use file::{FILE_LOADER_ID, FileLoader};

/// Environment prefix for configuration overrides (`KEYSTONE__SCOPE__PARENT=root`).
pub const ENV_PREFIX: &str = "KEYSTONE";

/// Custom error type for config loading.
#[keystone_derive::keystone_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// This function implements a layered configuration strategy:
/// 1. **Base File**: Loads settings from `path`; the format follows the file extension
///    (`.toml`, `.json`, `.yaml`, ...).
/// 2. **Environment Overrides**: Overlays values from environment variables prefixed with
///    `KEYSTONE__`. Nested structures are accessed using double underscores
///    (e.g., `KEYSTONE__PARAMETERS__REGION` maps to `parameters.region`).
///
/// # Errors
/// This function will return an error if:
/// * The configuration file cannot be found or parsed.
/// * The content of the file does not match the structure of type `T`.
///
/// # Example
/// ```rust,no_run
/// use keystone_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     workers: u16,
/// }
///
/// let cfg: AppConfig = load_config("config/local.toml").unwrap_or_default();
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();

    let builder = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    info!("Loading config from {}", path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Loads a [`ScopeConfig`] file and stamps ownership through the whole tree.
///
/// A file without a `name` takes its file stem as the Scope name.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid Scope record.
pub fn load_scope_config(path: impl AsRef<Path>) -> Result<ScopeConfig, ConfigError> {
    let path = path.as_ref();
    let mut scope: ScopeConfig = load_config(path)?;

    if scope.name().is_empty() {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        scope.set_name(stem);
    } else {
        scope.reparent();
    }

    Ok(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_domain::{Parameterized, ServiceSpec};
    use serial_test::serial;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    #[serial]
    fn scope_file_loads_with_owners() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "app.toml",
            r#"
parent = "root"

[parameters]
region = "eu"

[services.db]
implementation = "pool"

[services.db.clients.primary]
connector = "mock"

[context.tenant.services.audit]
implementation = "echo"
"#,
        );

        let scope = load_scope_config(&path).unwrap();
        assert_eq!(scope.name(), "app");
        assert_eq!(scope.parent(), Some("root"));
        assert!(scope.service("db").is_some_and(ServiceSpec::is_proxy));
        assert_eq!(scope.service("db").and_then(ServiceSpec::scope), Some("app"));

        let tenant = scope.scope("tenant").unwrap();
        assert_eq!(tenant.domain(), Some("app"));
        assert_eq!(tenant.service("audit").and_then(ServiceSpec::scope), Some("tenant"));
    }

    #[test]
    #[serial]
    fn scope_file_keeps_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let clients: String = ["j", "d", "a", "g", "b", "i", "c", "h", "e", "f"]
            .iter()
            .map(|name| format!("\n[services.db.clients.{name}]\nconnector = \"mock\"\n"))
            .collect();
        let body = format!(
            "[parameters]\nzeta = 1\nalpha = 2\nmid = 3\n\n[services.db]\nimplementation = \"pool\"\n{clients}"
        );
        let path = write_file(&dir, "app.toml", &body);

        for _ in 0..3 {
            let scope = load_scope_config(&path).unwrap();
            let proxy = scope.service("db").and_then(ServiceSpec::as_proxy).unwrap();
            assert_eq!(proxy.client_names(), ["j", "d", "a", "g", "b", "i", "c", "h", "e", "f"]);
            assert_eq!(scope.parameters().unwrap().names(), ["zeta", "alpha", "mid"]);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config::<serde_json::Value>("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().starts_with("Config error (Failed to build config)"));
    }
}
