use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use keystone_domain::{ScopeConfig, ServiceConfig};
use keystone_kernel::Catalog;
use keystone_kernel::testing::EchoService;
use keystone_scope::ScopeRegistry;

/// Builds a parent chain `s0 <- s1 <- ... <- s{depth}` with the Service declared at the root.
fn chain(depth: usize) -> ScopeRegistry {
    let registry = ScopeRegistry::new(Catalog::new().with_service("echo", EchoService::factory()));
    registry
        .register(&ScopeConfig::new("s0").with_service(ServiceConfig::new("db", "echo")))
        .expect("root scope");
    for level in 1..=depth {
        registry
            .register(&ScopeConfig::new(format!("s{level}")).with_parent(format!("s{}", level - 1)))
            .expect("chain scope");
    }
    registry
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    for depth in [0usize, 4, 16] {
        let registry = chain(depth);
        let leaf = registry.get(&format!("s{depth}")).expect("leaf scope");
        leaf.get_service("db").expect("warm cache");

        group.bench_with_input(BenchmarkId::new("get_service", depth), &leaf, |b, scope| {
            b.iter(|| scope.get_service("db").unwrap());
        });
        group.bench_with_input(BenchmarkId::new("miss", depth), &leaf, |b, scope| {
            b.iter(|| scope.get_service("absent").unwrap());
        });
    }

    let registry = chain(0);
    group.bench_function("get_or_create_hit", |b| {
        b.iter(|| registry.get_or_create("s0").unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
