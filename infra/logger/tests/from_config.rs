use keystone_logger::{LogRotation, Logger, LoggerConfig};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn config_file_section_drives_json_file_output() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("json-logs");

    let config: LoggerConfig = serde_json::from_value(serde_json::json!({
        "name": "integration-from-config",
        "console": false,
        "path": log_dir,
        "level": "debug",
        "rotation": "never",
        "json": true
    }))?;
    assert_eq!(config.rotation, LogRotation::Never);

    let logger = Logger::from_config(&config)?;
    assert!(logger.guard().is_some());

    tracing::debug!(scope = "app", "scope registered");
    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(log_file)?;
    let first = contents.lines().next().expect("at least one line");
    let line: serde_json::Value = serde_json::from_str(first)?;
    assert_eq!(line["fields"]["scope"], "app");

    Ok(())
}
