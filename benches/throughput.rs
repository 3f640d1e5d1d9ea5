use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use gatehouse::{
    CatalogBuilder, ClassDescriptor, ComponentNode, HandlerRegistry, Request, Rule,
    VerificationError, Verifier,
};

fn allow(_: &Rule, _: &Request, _: Option<&str>) -> Result<(), VerificationError> {
    Ok(())
}

fn build_shared_verifier() -> (Arc<Verifier>, Arc<ClassDescriptor>) {
    let n = 20;
    let catalog = CatalogBuilder::new()
        .class("ArticlePresenter", |mut c| {
            c = c.handler("Article");
            for i in 0..n {
                c = c.rule(Rule::new(format!("H{}", i % 4)));
            }
            c.method("actionEdit", |m| m.rule(Rule::new("H0")))
                .method("handleDelete", |m| m.rule(Rule::new("H1")))
        })
        .build()
        .unwrap();
    let class = Arc::clone(catalog.class("ArticlePresenter").unwrap());

    let mut registry = HandlerRegistry::new();
    for i in 0..4 {
        registry = registry.register(&format!("H{i}"), || allow);
    }
    let verifier = Verifier::builder()
        .catalog(Arc::new(catalog))
        .handler_resolver(registry)
        .build()
        .unwrap();
    (Arc::new(verifier), class)
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let (verifier, class) = build_shared_verifier();
        let request = Request::new("Article").action("edit").signal("delete");

        group.bench_function(&format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let v = Arc::clone(&verifier);
                        let req = request.clone();
                        let root = ComponentNode::root(Arc::clone(&class));
                        thread::spawn(move || {
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                let _ = v.is_link_verified(&req, &root);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
