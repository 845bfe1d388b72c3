use keystone_domain::{
    ClientConfig, Named, ObjectReferenceConfig, Parameterized, Parameters, ProviderConfig,
    ProxyServiceConfig, ScopeConfig, ServiceConfig,
};
use keystone_kernel::Catalog;
use keystone_kernel::testing::{EchoService, Journal, MapProvider, MockConnectorFactory};
use keystone_scope::{ScopeError, ScopeRegistry};
use keystone_service::ServiceState;
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;

struct Fixture {
    journal: Journal,
    registry: ScopeRegistry,
}

fn fixture() -> Fixture {
    let journal = Journal::default();
    let catalog = Catalog::new()
        .with_service("echo", EchoService::factory_with_journal(journal.clone()))
        .with_provider("map", MapProvider::from_config)
        .with_connector("mock", MockConnectorFactory::with_journal(journal.clone()));
    Fixture { journal, registry: ScopeRegistry::new(catalog) }
}

fn connect_on_create() -> Parameters {
    Parameters::new().with("connect-on-create", true)
}

#[test]
fn get_or_create_returns_the_same_instance() {
    let Fixture { registry, .. } = fixture();
    let first = registry.get_or_create("app").unwrap();
    let second = registry.get_or_create("app").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.names(), ["app"]);
    assert!(matches!(registry.get_or_create(""), Err(ScopeError::InvalidConfiguration { .. })));
}

#[test]
fn concurrent_get_or_create_yields_one_instance() {
    let Fixture { registry, .. } = fixture();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.get_or_create("shared").unwrap()
            })
        })
        .collect();
    let scopes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(scopes.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(registry.len(), 1);
}

#[test]
fn register_merges_into_the_live_scope() {
    let Fixture { registry, .. } = fixture();
    let first = registry
        .register(&ScopeConfig::new("app").with_service(ServiceConfig::new("db", "echo")))
        .unwrap();
    let second = registry
        .register(&ScopeConfig::new("app").with_provider(ProviderConfig::new("p", "map")))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    let config = second.config();
    assert!(config.service("db").is_some());
    assert_eq!(config.provider("p").and_then(|p| p.scope()), Some("app"));
}

#[test]
fn update_keeps_the_registry_name() {
    let Fixture { registry, .. } = fixture();
    let app = registry.get_or_create("app").unwrap();
    app.update(&ScopeConfig::new("renamed").with_service(ServiceConfig::new("db", "echo")))
        .unwrap();

    let config = app.config();
    assert_eq!(config.name(), "app");
    assert_eq!(config.service("db").and_then(|s| s.scope()), Some("app"));
    assert!(!registry.contains("renamed"));
}

#[test]
fn add_child_links_both_directions() {
    let Fixture { registry, .. } = fixture();
    let domain = registry.get_or_create("domain").unwrap();
    let child = domain.add_child(ScopeConfig::new("leaf")).unwrap();

    assert_eq!(child.domain().as_deref(), Some("domain"));
    assert_eq!(domain.children(), ["leaf"]);
    assert!(Arc::ptr_eq(&domain.child("leaf").unwrap(), &child));
    assert!(domain.child("stranger").is_none());
}

#[test]
fn live_names_reject_duplicates() {
    let Fixture { registry, .. } = fixture();
    let app = registry
        .register(
            &ScopeConfig::new("app")
                .with_service(ServiceConfig::new("db", "echo"))
                .with_provider(ProviderConfig::new("p", "map")),
        )
        .unwrap();

    // Before instantiation the record is simply replaced.
    app.add_service(ServiceConfig::new("db", "echo")).unwrap();

    app.get_service("db").unwrap().unwrap();
    app.get_provider("p").unwrap().unwrap();
    assert!(matches!(app.add_service(ServiceConfig::new("db", "echo")), Err(ScopeError::Duplicate { .. })));
    assert!(matches!(app.add_provider(ProviderConfig::new("p", "map")), Err(ScopeError::Duplicate { .. })));

    app.add_object_reference(ObjectReferenceConfig::new("r", "p", "a"));
    app.add_object_reference(ObjectReferenceConfig::new("r", "p", "b"));
    assert_eq!(app.get_object_reference("r").unwrap().unwrap().object, "b");
}

#[test]
fn remove_service_closes_the_live_instance() {
    let Fixture { registry, journal } = fixture();
    let app = registry
        .register(&ScopeConfig::new("app").with_service(ServiceConfig::new("db", "echo")))
        .unwrap();
    let db = app.get_service("db").unwrap().unwrap();

    let removed = app.remove_service("db").unwrap();
    assert!(removed.is_some());
    assert_eq!(db.state(), ServiceState::Closed);
    assert_eq!(journal.matching("shutdown"), ["shutdown:db"]);
    assert!(app.get_service("db").unwrap().is_none());
    assert!(app.config().services().is_none());
}

#[test]
fn attach_client_promotes_a_plain_registration() {
    let Fixture { registry, .. } = fixture();
    let params = Parameters::new().with("config-target", "$self").with("pool", 2);
    let app = registry
        .register(&ScopeConfig::new("app").with_service(ServiceConfig::new("db", "echo").with_parameters(params)))
        .unwrap();

    app.attach_client("db", ClientConfig::new("primary", "mock")).unwrap();

    let config = app.config();
    let spec = config.service("db").unwrap();
    let proxy = spec.as_proxy().expect("promoted");
    assert_eq!(spec.implementation(), "echo");
    assert_eq!(proxy.service().parameter("pool"), Some(&json!(2)));
    assert!(proxy.service().parameter("config-target").is_none());
    assert_eq!(proxy.client_names(), ["primary"]);
    assert_eq!(proxy.client("primary").and_then(|c| c.service()), Some("db"));

    // Not live yet: the first resolution builds the proxy with its recorded clients.
    assert!(app.live_service_names().is_empty());
    let live = app.proxy("db").unwrap();
    assert_eq!(live.client_names(), ["primary"]);
}

#[test]
fn attach_client_wraps_a_live_instance_in_place() {
    let Fixture { registry, journal } = fixture();
    let app = registry
        .register(&ScopeConfig::new("app").with_service(ServiceConfig::new("db", "echo")))
        .unwrap();
    let plain = app.get_service("db").unwrap().unwrap();
    assert!(matches!(app.proxy("db"), Err(ScopeError::NotProxy { .. })));

    let client = ClientConfig::new("primary", "mock").with_parameters(connect_on_create());
    app.attach_client("db", client).unwrap();

    let proxy = app.proxy("db").unwrap();
    assert!(Arc::ptr_eq(proxy.instance(), plain.instance()));
    assert_eq!(proxy.state(), ServiceState::Ready);
    assert!(proxy.is_connected("primary").unwrap());
    assert_eq!(journal.matching("init"), ["init:app/db/primary"]);

    // A name already held by the live proxy is rejected and not recorded twice.
    let err = app.attach_client("db", ClientConfig::new("primary", "other")).unwrap_err();
    assert!(matches!(err, ScopeError::Service { .. }));
    let config = app.config();
    let recorded = config.service("db").and_then(|s| s.as_proxy()).and_then(|p| p.client("primary"));
    assert_eq!(recorded.map(|c| c.connector.as_str()), Some("mock"));
}

#[test]
fn attach_client_requires_a_local_registration() {
    let Fixture { registry, .. } = fixture();
    registry
        .register(&ScopeConfig::new("root").with_service(ServiceConfig::new("db", "echo")))
        .unwrap();
    let app = registry.register(&ScopeConfig::new("app").with_parent("root")).unwrap();

    let err = app.attach_client("db", ClientConfig::new("c", "mock")).unwrap_err();
    assert!(matches!(err, ScopeError::ServiceNotFound { .. }));
}

#[test]
fn proxy_registrations_build_their_clients_on_first_use() {
    let Fixture { registry, journal } = fixture();
    let service = ProxyServiceConfig::new("db", "echo")
        .with_client(ClientConfig::new("a", "mock").with_parameters(connect_on_create()))
        .with_client(ClientConfig::new("b", "mock"));
    let app = registry.register(&ScopeConfig::new("app").with_service(service)).unwrap();

    let proxy = app.proxy("db").unwrap();
    assert_eq!(proxy.client_names(), ["a", "b"]);
    assert_eq!(journal.matching("connect"), ["connect:a"]);

    let handle = app.get_service("db").unwrap().unwrap();
    assert!(handle.is_proxy());
    assert!(Arc::ptr_eq(handle.instance(), proxy.instance()));
}

#[test]
fn failed_proxy_instantiation_closes_what_it_built() {
    let Fixture { registry, journal } = fixture();
    let service = ProxyServiceConfig::new("db", "echo")
        .with_client(ClientConfig::new("a", "mock").with_parameters(connect_on_create()))
        .with_client(ClientConfig::new("b", "mock").with_parameters(Parameters::new().with("fail-init", true)));
    let app = registry.register(&ScopeConfig::new("app").with_service(service)).unwrap();

    assert!(matches!(app.get_service("db"), Err(ScopeError::Service { .. })));
    assert!(app.live_service_names().is_empty());
    assert_eq!(
        journal.entries(),
        ["init:app/db/a", "connect:a", "init:app/db/b", "disconnect:a", "destroy:a", "shutdown:db"]
    );

    journal.clear();
    registry.teardown_all().unwrap();
    assert!(journal.entries().is_empty());
}

#[test]
fn teardown_closes_services_and_keeps_configuration() {
    let Fixture { registry, journal } = fixture();
    let service = ProxyServiceConfig::new("db", "echo")
        .with_client(ClientConfig::new("a", "mock").with_parameters(connect_on_create()));
    let app = registry
        .register(
            &ScopeConfig::new("app")
                .with_service(service)
                .with_provider(ProviderConfig::new("p", "map"))
                .with_scope(ScopeConfig::new("leaf").with_service(ServiceConfig::new("cache", "echo"))),
        )
        .unwrap();
    app.get_service("db").unwrap();
    app.get_provider("p").unwrap();
    let leaf = registry.get("leaf").unwrap();
    let cache = leaf.get_service("cache").unwrap().unwrap();
    journal.clear();

    app.teardown().unwrap();
    assert_eq!(journal.entries(), ["disconnect:a", "destroy:a", "shutdown:db"]);
    assert!(app.live_service_names().is_empty());
    assert!(!app.has_live_provider("p"));
    assert!(app.config().service("db").is_some());
    assert_eq!(cache.state(), ServiceState::Ready);
}

#[test]
fn failed_close_keeps_the_service_cached() {
    let Fixture { registry, .. } = fixture();
    let failing = ServiceConfig::new("bad", "echo").with_parameters(Parameters::new().with("fail-shutdown", true));
    let app = registry
        .register(&ScopeConfig::new("app").with_service(failing).with_service(ServiceConfig::new("good", "echo")))
        .unwrap();
    app.get_service("bad").unwrap();
    let good = app.get_service("good").unwrap().unwrap();

    let err = app.teardown().unwrap_err();
    assert!(matches!(err, ScopeError::Service { .. }));
    assert_eq!(app.live_service_names(), ["bad"]);
    assert_eq!(good.state(), ServiceState::Closed);
    assert!(app.remove_service("bad").is_err());
}

#[test]
fn remove_and_teardown_all_empty_the_registry() {
    let Fixture { registry, .. } = fixture();
    let app = registry
        .register(&ScopeConfig::new("app").with_service(ServiceConfig::new("db", "echo")))
        .unwrap();
    registry.register(&ScopeConfig::new("other")).unwrap();
    let db = app.get_service("db").unwrap().unwrap();

    assert!(registry.remove("app").unwrap());
    assert!(!registry.remove("app").unwrap());
    assert_eq!(db.state(), ServiceState::Closed);
    assert_eq!(registry.names(), ["other"]);

    registry.teardown_all().unwrap();
    assert!(registry.is_empty());
}
