use keystone_domain::constants::{CONFIG_TARGET, SELF_TARGET};
use keystone_domain::{
    ClientConfig, Named, ObjectReferenceConfig, Parameterized, Parameters, ProviderConfig,
    ScopeConfig, ServiceConfig, ServiceSpec,
};
use serde_json::json;

#[test]
fn scope_config_deserializes_and_stamps_owners() {
    let raw = json!({
        "name": "app",
        "parent": "root",
        "parameters": { "region": "eu" },
        "providers": { "cache": { "implementation": "map" } },
        "services": {
            "db": { "implementation": "pool", "clients": { "primary": { "connector": "mock" } } },
            "echo": { "implementation": "echo" }
        },
        "object-references": { "settings": { "provider": "cache", "object": "settings" } },
        "context": { "tenant": { "services": { "audit": { "implementation": "echo" } } } }
    });

    let mut cfg: ScopeConfig = serde_json::from_value(raw).expect("scope config deserialize");
    cfg.reparent();

    assert_eq!(cfg.name(), "app");
    assert_eq!(cfg.parent(), Some("root"));
    assert_eq!(cfg.parameter("region"), Some(&json!("eu")));
    assert_eq!(cfg.provider("cache").and_then(ProviderConfig::scope), Some("app"));
    assert!(cfg.service("db").is_some_and(ServiceSpec::is_proxy));
    assert!(!cfg.service("echo").is_some_and(ServiceSpec::is_proxy));
    assert_eq!(cfg.object_reference("settings").map(|r| r.object.as_str()), Some("settings"));

    let tenant = cfg.scope("tenant").expect("child scope");
    assert_eq!(tenant.domain(), Some("app"));
    assert_eq!(tenant.service("audit").and_then(ServiceSpec::scope), Some("tenant"));
}

#[test]
fn update_merges_structurally() {
    let mut target = ScopeConfig::new("app")
        .with_service(ServiceConfig::new("db", "pool"))
        .with_provider(ProviderConfig::new("cache", "map"));
    target.set_parameter("region", "eu");
    target.set_parameter("tier", "gold");

    let mut source = ScopeConfig::default()
        .with_parent("root")
        .with_service(ServiceConfig::new("db", "replica"))
        .with_object_reference(ObjectReferenceConfig::new("settings", "cache", "settings"));
    source.set_parameter("region", "us");

    target.update(&source);

    assert_eq!(target.name(), "app");
    assert_eq!(target.parent(), Some("root"));
    assert_eq!(target.parameter("region"), Some(&json!("us")));
    assert_eq!(target.parameter("tier"), Some(&json!("gold")));
    assert_eq!(target.service("db").map(ServiceSpec::implementation), Some("replica"));
    assert_eq!(target.service("db").and_then(ServiceSpec::scope), Some("app"));
    assert!(target.provider("cache").is_some());
    assert_eq!(
        target.object_reference("settings").and_then(ObjectReferenceConfig::scope),
        Some("app")
    );
}

#[test]
fn update_without_fields_changes_nothing() {
    let mut target = ScopeConfig::new("app").with_parent("root");
    let before = target.clone();
    target.update(&ScopeConfig::default());
    assert_eq!(target, before);
}

#[test]
fn promote_service_replaces_registration_in_place() {
    let service = ServiceConfig::new("db", "pool")
        .with_parameters(Parameters::new().with(CONFIG_TARGET, SELF_TARGET).with("size", 4));
    let mut cfg = ScopeConfig::new("app")
        .with_service(ServiceConfig::new("first", "echo"))
        .with_service(service)
        .with_service(ServiceConfig::new("last", "echo"));

    assert!(cfg.promote_service("db"));
    assert!(!cfg.promote_service("missing"));

    let names: Vec<_> = cfg.services().map(|s| s.names()).unwrap_or_default();
    assert_eq!(names, ["first", "db", "last"]);

    let spec = cfg.service_mut("db").expect("promoted service");
    let proxy = spec.as_proxy_mut().expect("proxy registration");
    proxy.add_client(ClientConfig::new("primary", "mock"));

    let proxy = cfg.service("db").and_then(ServiceSpec::as_proxy).expect("proxy");
    assert_eq!(proxy.service().implementation, "pool");
    assert_eq!(proxy.parameter("size"), Some(&json!(4)));
    assert!(proxy.parameter(CONFIG_TARGET).is_none());
    assert_eq!(proxy.client("primary").and_then(ClientConfig::service), Some("db"));
    assert_eq!(proxy.service().scope(), Some("app"));
}

#[test]
fn collections_collapse_when_emptied() {
    let mut cfg = ScopeConfig::new("app")
        .with_provider(ProviderConfig::new("cache", "map"))
        .with_scope(ScopeConfig::new("child"));
    cfg.set_parameter("only", 1);

    cfg.remove_parameter("only");
    cfg.remove_provider("cache");
    cfg.remove_scope("child");

    assert!(!cfg.has_parameters());
    assert!(cfg.parameters().is_none());
    assert!(cfg.providers().is_none());
    assert!(cfg.scopes().is_none());
}

#[test]
fn serialization_omits_owner_links() {
    let cfg = ScopeConfig::new("app").with_scope(ScopeConfig::new("child"));
    let value = serde_json::to_value(&cfg).expect("serialize");

    assert_eq!(value, json!({ "name": "app", "scopes": { "child": { "name": "child" } } }));
}
