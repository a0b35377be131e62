use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, Utc};
use logiflow_agents::{ProductRepository, Reservation, ValidationRules};
use logiflow_core::{Entity, ProductId};
use logiflow_infra::store::InMemoryProductStore;
use logiflow_infra::{FulfillmentContext, Orchestrator, OrderLine, SubmitOrder};
use logiflow_inventory::{NewProduct, Product, ProductCategory};
use std::sync::Arc;
use std::thread;

fn product(sku: &str, stock: u32) -> Product {
    Product::new(
        ProductId::new(),
        NewProduct {
            sku: sku.to_string(),
            name: format!("Bench {sku}"),
            category: ProductCategory::ConstructionMaterials,
            unit_weight_kg: 5.0,
            unit_volume_m3: 0.01,
            unit_price: 990,
            stock,
            location: "B-1".to_string(),
        },
    )
    .unwrap()
}

fn seeded_store(lines: usize, stock: u32) -> (InMemoryProductStore, Vec<Reservation>) {
    let store = InMemoryProductStore::new();
    let reservations = (0..lines)
        .map(|i| {
            let sku = format!("SKU-{i:04}");
            let p = store.insert(product(&sku, stock)).unwrap();
            Reservation {
                product_id: *p.id(),
                sku,
                quantity: 1,
            }
        })
        .collect();
    (store, reservations)
}

fn bench_reserve_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_all");

    for lines in [1usize, 5, 25] {
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::new("uncontended", lines), &lines, |b, &lines| {
            let (store, reservations) = seeded_store(lines, u32::MAX);
            b.iter(|| {
                black_box(store.reserve_all(black_box(&reservations)).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_contended_reservations(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_all_contended");
    group.sample_size(20);

    for threads in [2usize, 4, 8] {
        let per_thread = 500usize;
        group.throughput(Throughput::Elements((threads * per_thread) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let (store, reservations) = seeded_store(3, u32::MAX);
                let store = Arc::new(store);
                let reservations = Arc::new(reservations);
                let workers: Vec<_> = (0..threads)
                    .map(|_| {
                        let store = Arc::clone(&store);
                        let reservations = Arc::clone(&reservations);
                        thread::spawn(move || {
                            for _ in 0..per_thread {
                                store.reserve_all(&reservations).unwrap();
                            }
                        })
                    })
                    .collect();
                for w in workers {
                    w.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(1));

    group.bench_function("submit_and_process", |b| {
        let ctx = FulfillmentContext::in_memory();
        ctx.products.insert(product("PIPE-1", u32::MAX)).unwrap();
        ctx.products.insert(product("PIPE-2", u32::MAX)).unwrap();
        let orchestrator = Orchestrator::new(ctx, ValidationRules::default());

        b.iter(|| {
            let order = orchestrator
                .submit(SubmitOrder {
                    client_id: "BENCH".into(),
                    client_name: "Bench GmbH".into(),
                    delivery_address: "Alexanderplatz 1, Berlin".into(),
                    requested_delivery: Utc::now() + Duration::days(3),
                    lines: vec![
                        OrderLine { sku: "PIPE-1".into(), quantity: 2 },
                        OrderLine { sku: "PIPE-2".into(), quantity: 1 },
                    ],
                })
                .unwrap();
            black_box(orchestrator.process(order.id_typed()));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_reserve_all,
    bench_contended_reservations,
    bench_full_pipeline
);
criterion_main!(benches);
