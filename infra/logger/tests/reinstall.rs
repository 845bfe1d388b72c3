use keystone_logger::{Logger, LoggerConfig, LoggerError};

#[test]
fn config_without_outputs_or_second_install_is_rejected() {
    let silent = LoggerConfig { console: false, path: None, ..LoggerConfig::default() };
    let err = Logger::from_config(&silent).expect_err("no output layers");
    assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

    let bad_level = LoggerConfig { level: "loud".into(), ..LoggerConfig::default() };
    let err = Logger::from_config(&bad_level).expect_err("unknown level");
    assert!(err.to_string().contains("loud"));

    let config = LoggerConfig { name: "keystone-reinstall".into(), ..LoggerConfig::default() };
    let _logger = Logger::from_config(&config).expect("first install should succeed");

    let err = Logger::from_config(&config).expect_err("second install should fail");
    assert!(
        matches!(err, LoggerError::Subscriber { .. }),
        "expected subscriber error for second install"
    );
}
