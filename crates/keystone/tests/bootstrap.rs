use keystone::ServiceState;
use keystone::kernel::testing::{EchoService, MockConnectorFactory};
use keystone::prelude::*;
use serde_json::json;
use serial_test::serial;
use std::path::{Path, PathBuf};

fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn catalog() -> Catalog {
    Catalog::new()
        .with_service("echo", EchoService::factory())
        .with_connector("mock", MockConnectorFactory::default())
}

#[test]
#[serial]
fn scope_files_are_registered_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "db.json", r#"{ "pool": 8 }"#);
    let root = write_file(
        dir.path(),
        "root.toml",
        r#"
[services.db]
implementation = "echo"
parameters = { config-class = "file", config-path = "db.json" }

[services.cache]
implementation = "echo"
proxy = true

[services.cache.clients.primary]
connector = "mock"
parameters = { connect-on-create = true }
"#,
    );
    let app = write_file(
        dir.path(),
        "app.toml",
        r#"
parent = "root"

[context.worker]
parameters = { threads = 2 }
"#,
    );

    let keystone = Keystone::builder()
        .catalog(catalog())
        .config_dir(dir.path())
        .scope_file(&root)
        .scope_file(&app)
        .build()
        .unwrap();

    assert_eq!(keystone.registry().names(), ["app", "root", "worker"]);

    let app = keystone.scope("app").unwrap();
    let db = app.get_service("db").unwrap().expect("inherited from root");
    let config = db.execute("config", &Parameters::new()).unwrap();
    assert_eq!(config.as_value(), Some(&json!({"pool": 8})));

    let worker = keystone.scope("worker").unwrap();
    assert_eq!(worker.domain().as_deref(), Some("app"));
    assert_eq!(worker.parameter("threads"), Some(json!(2)));
    let cache = worker.proxy("cache").unwrap();
    assert!(cache.is_connected("primary").unwrap());

    keystone.shutdown().unwrap();
    assert_eq!(db.state(), ServiceState::Closed);
}

#[test]
fn programmatic_scopes_mix_with_defaults() {
    let keystone = Keystone::builder()
        .scope(ScopeConfig::new("root").with_service(ServiceConfig::new("svc", "echo")))
        .build()
        .unwrap();

    assert!(keystone.catalog().loader("file").is_some());
    keystone.catalog().register_service("echo", EchoService::factory());
    let svc = keystone.scope("root").unwrap().get_service("svc").unwrap().unwrap();
    assert_eq!(svc.state(), ServiceState::Ready);
}

#[test]
fn missing_scope_file_is_reported() {
    let err = Keystone::builder().scope_file("does/not/exist.toml").build().unwrap_err();
    assert!(matches!(err, KeystoneError::Config { .. }));
    assert!(err.to_string().contains("exist.toml"));
}

#[test]
fn unnamed_scope_is_rejected() {
    let err = Keystone::builder().scope(ScopeConfig::default()).build().unwrap_err();
    assert!(matches!(err, KeystoneError::Scope { .. }));
}
