mod common;

use std::sync::Arc;

use common::*;
use item_processor::{ItemId, ProcessorSystem};
use proptest::prelude::*;

const STORED: ItemId = 15;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: every submitted id lands in exactly one of successes or absent
    #[test]
    fn every_id_is_accounted_for(
        ids in prop::collection::vec(1..=30i64, 0..60),
        capacity in 1usize..8,
    ) {
        let runtime = runtime();
        let store = Arc::new(MockStore::with_items(items(1..=STORED)));
        let system = ProcessorSystem::bootstrap_with_handle(
            config_with_capacity(capacity),
            store,
            runtime.handle().clone(),
        )
        .expect("bootstrap");

        let outcome = system
            .service()
            .start_batch(Some(ids.clone()))
            .expect("handle")
            .wait()
            .expect("outcome");
        runtime.block_on(system.shutdown());

        let present = ids.iter().filter(|id| **id <= STORED).count();
        let result = outcome.result();

        prop_assert!(outcome.is_success());
        prop_assert_eq!(result.total(), ids.len());
        prop_assert_eq!(result.outcome_count(), ids.len());
        prop_assert_eq!(result.successes().len(), present);
        prop_assert_eq!(result.absent().len(), ids.len() - present);
        prop_assert!(result.successes().iter().all(|item| item.status == "PROCESSED"));
    }
}
