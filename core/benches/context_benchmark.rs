use arc_core::api::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;

struct Leaf(u64);
struct Node {
    leaf: Arc<Leaf>,
}

fn container() -> Container {
    Container::builder()
        .register(BeanDefinition::builder(ScopeKind::Request, |_| Ok(Leaf(7))).build())
        .register(
            BeanDefinition::builder(ScopeKind::Request, |ctx| {
                Ok(Node {
                    leaf: ctx.get_default::<Leaf>()?,
                })
            })
            .depends_on(BeanId::of::<Leaf>())
            .build(),
        )
        .register(
            BeanDefinition::builder(ScopeKind::Application, |_| Ok(Leaf(1)))
                .qualifier("shared")
                .build(),
        )
        .build()
        .expect("benchmark container")
}

fn benchmark_activation_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("activation");
    group.measurement_time(Duration::from_secs(5));

    let container = container();
    let request = container.request_context();
    let node = container.select::<Node>().expect("node proxy");

    group.bench_function("activate_terminate_empty", |b| {
        b.iter(|| {
            request.activate().expect("activate");
            request.terminate().expect("terminate");
        });
    });

    group.bench_function("activate_resolve_terminate", |b| {
        b.iter(|| {
            request.activate().expect("activate");
            let value = node.with(|n| n.leaf.0).expect("resolve");
            request.terminate().expect("terminate");
            black_box(value)
        });
    });

    group.bench_function("suspend_resume", |b| {
        request.activate().expect("activate");
        node.get().expect("resolve");
        b.iter(|| {
            let state = request.state().expect("state");
            request.deactivate().expect("deactivate");
            request.activate_with(black_box(&state)).expect("resume");
        });
        request.terminate().expect("terminate");
    });

    group.finish();
}

fn benchmark_proxy_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("proxy");

    let container = container();
    let request = container.request_context();
    let node = container.select::<Node>().expect("node proxy");
    let shared = container
        .get_instance::<Leaf>(&BeanId::qualified::<Leaf>("shared"))
        .expect("shared proxy");

    request.activate().expect("activate");
    for (name, calls) in [("warm", 1u64), ("batch", 100u64)] {
        group.bench_with_input(BenchmarkId::new("request_hit", name), &calls, |b, &calls| {
            b.iter(|| {
                let mut total = 0;
                for _ in 0..calls {
                    total += node.with(|n| n.leaf.0).expect("resolve");
                }
                black_box(total)
            });
        });
    }
    group.bench_function("application_hit", |b| {
        b.iter(|| black_box(shared.with(|leaf| leaf.0).expect("resolve")));
    });
    group.bench_function("lookup_proxy", |b| {
        b.iter(|| black_box(container.select::<Node>().expect("node proxy")));
    });
    request.terminate().expect("terminate");

    group.finish();
}

criterion_group!(benches, benchmark_activation_cycle, benchmark_proxy_resolution);
criterion_main!(benches);
