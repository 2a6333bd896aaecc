use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use item_processor::{InMemoryItemStore, ProcessorConfig, ProcessorSystem};

fn benchmark_config_creation(c: &mut Criterion) {
    c.bench_function("config_creation", |b| b.iter(ProcessorConfig::default));
}

fn benchmark_batch_of_1000(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let store = Arc::new(InMemoryItemStore::seeded(1000));
    let system = ProcessorSystem::bootstrap_with_handle(
        ProcessorConfig::default(),
        store,
        runtime.handle().clone(),
    )
    .expect("bootstrap");

    c.bench_function("batch_of_1000", |b| {
        b.iter(|| {
            let handle = system.service().start_batch(None).expect("handle");
            black_box(runtime.block_on(handle.join()).expect("outcome"))
        })
    });

    runtime.block_on(system.shutdown());
}

criterion_group!(benches, benchmark_config_creation, benchmark_batch_of_1000);
criterion_main!(benches);
