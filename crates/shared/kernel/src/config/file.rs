use keystone_domain::constants::CONFIG_PATH;
use keystone_domain::{Parameters, Value};
use std::path::PathBuf;
use tracing::debug;

use crate::loader::{Loader, LoaderError, LoaderErrorExt};

/// Id under which [`FileLoader`] is conventionally registered.
pub const FILE_LOADER_ID: &str = "file";

/// Loader reading a Service's configuration object from the file named by `config-path`.
///
/// Relative paths resolve against `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    base_dir: Option<PathBuf>,
}

impl FileLoader {
    #[must_use]
    pub const fn new() -> Self {
        Self { base_dir: None }
    }

    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: Some(base_dir.into()) }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}

impl Loader for FileLoader {
    fn load(
        &self,
        scope: &str,
        loader_id: &str,
        parameters: Option<&Parameters>,
    ) -> Result<Option<Value>, LoaderError> {
        let Some(path) = parameters.and_then(|p| p.get_str(CONFIG_PATH)) else {
            return Err(LoaderError::MissingParameter {
                message: CONFIG_PATH.into(),
                context: Some(format!("scope '{scope}', loader '{loader_id}'").into()),
            });
        };

        let path = self.resolve(path);
        debug!(scope, loader_id, path = %path.display(), "Loading service configuration");

        let value = super::load_config::<Value>(&path)
            .context(format!("scope '{scope}', file '{}'", path.display()))?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    #[serial]
    fn loads_file_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db.json"), r#"{"url": "mem://", "size": 4}"#).unwrap();

        let loader = FileLoader::with_base_dir(dir.path());
        let params = Parameters::new().with(CONFIG_PATH, "db.json");
        let value = loader.load("app", FILE_LOADER_ID, Some(&params)).unwrap();

        assert_eq!(value, Some(json!({"url": "mem://", "size": 4})));
    }

    #[test]
    fn missing_path_parameter_is_reported() {
        let err = FileLoader::new().load("app", FILE_LOADER_ID, None).unwrap_err();
        assert!(matches!(err, LoaderError::MissingParameter { .. }));
        assert_eq!(err.severity(), keystone_domain::Severity::Warning);
    }

    #[test]
    #[serial]
    fn unreadable_file_wraps_config_error() {
        let params = Parameters::new().with(CONFIG_PATH, "/nope/missing.toml");
        let err = FileLoader::new().load("app", FILE_LOADER_ID, Some(&params)).unwrap_err();
        assert!(matches!(err, LoaderError::Config { .. }));
    }
}
