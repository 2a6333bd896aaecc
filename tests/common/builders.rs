use std::sync::Arc;

use item_processor::{Item, ItemId, ItemStore, ProcessorConfig, ProcessorSystem};

pub fn item(id: ItemId) -> Item {
    Item::new(
        id,
        format!("Test Item {id}"),
        Some(&format!("Description{id}")),
        "NEW",
        format!("test{id}@example.com"),
    )
}

pub fn items(ids: impl IntoIterator<Item = ItemId>) -> Vec<Item> {
    ids.into_iter().map(item).collect()
}

pub fn config_with_capacity(capacity: usize) -> ProcessorConfig {
    let mut config = ProcessorConfig::default();
    config.worker_pool.capacity = capacity;
    config.worker_pool.shutdown_timeout_ms = 5_000;
    config
}

/// Bootstrap on the current runtime with the given pool capacity
pub fn system_with(store: Arc<dyn ItemStore>, capacity: usize) -> ProcessorSystem {
    ProcessorSystem::bootstrap(config_with_capacity(capacity), store).expect("bootstrap")
}

/// Poll `condition` until it holds, failing the test after five seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
}
