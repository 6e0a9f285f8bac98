//! Log store throughput benchmarks
//!
//! - Inserts into the service and host indexes (with and without the global index)
//! - Range queries by service, and by service and host
//! - Retention sweeps
//!
//! Run with: cargo bench --bench store_throughput

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use logvault::core::LogEvent;
use logvault::producer::SERVICE_HOSTS;
use logvault::storage::{LogStore, StoreConfig};

const PRELOADED: i64 = 100_000;

fn event_at(ts: i64) -> LogEvent {
    let (service, hosts) = SERVICE_HOSTS[ts as usize % SERVICE_HOSTS.len()];
    let host = hosts[(ts as usize / SERVICE_HOSTS.len()) % hosts.len()];
    LogEvent::new(ts, service, host, format!("Log message from {}@{}", service, host))
}

fn preloaded_store(config: StoreConfig) -> LogStore {
    let store = LogStore::with_config(config);
    for ts in 0..PRELOADED {
        store.insert(event_at(ts));
    }
    store
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(1));

    let store = LogStore::new();
    let mut ts = 0;
    group.bench_function("service_and_host", |b| {
        b.iter(|| {
            ts += 1;
            store.insert(black_box(event_at(ts)));
        })
    });

    let store = LogStore::with_config(StoreConfig {
        enable_global_index: true,
        ..StoreConfig::default()
    });
    let mut ts = 0;
    group.bench_function("with_global_index", |b| {
        b.iter(|| {
            ts += 1;
            store.insert(black_box(event_at(ts)));
        })
    });

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let store = preloaded_store(StoreConfig::default());
    let mut group = c.benchmark_group("query");

    for span in [100_i64, 10_000] {
        let from = PRELOADED / 2;
        group.bench_function(format!("by_service/{}ms", span), |b| {
            b.iter(|| store.query_by_service(black_box("PaymentService"), from, from + span))
        });
        group.bench_function(format!("by_service_and_host/{}ms", span), |b| {
            b.iter(|| {
                store.query_by_service_and_host(
                    black_box("OrderService"),
                    black_box("order-node-1"),
                    from,
                    from + span,
                )
            })
        });
    }

    group.finish();
}

fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");
    group.sample_size(10);

    group.bench_function("evict_half", |b| {
        b.iter_batched(
            || preloaded_store(StoreConfig::default()),
            |store| store.evict_before(black_box(PRELOADED / 2)),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("evict_nothing", |b| {
        let store = preloaded_store(StoreConfig::default());
        b.iter(|| store.evict_before(black_box(0)))
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_queries, bench_eviction);
criterion_main!(benches);
