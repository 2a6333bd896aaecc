//! # Item Service
//!
//! Request-facing operations over the item store: plain CRUD passthroughs and
//! batch processing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::BatchConfig;
use crate::error::Result;
use crate::models::{Item, ItemId};
use crate::orchestration::{BatchCoordinator, BatchHandle, BatchOutcome};
use crate::store::ItemStore;

#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn ItemStore>,
    coordinator: BatchCoordinator,
    config: BatchConfig,
}

impl ItemService {
    pub fn new(store: Arc<dyn ItemStore>, coordinator: BatchCoordinator, config: BatchConfig) -> Self {
        Self {
            store,
            coordinator,
            config,
        }
    }

    pub fn find_all(&self) -> Result<Vec<Item>> {
        Ok(self.store.find_all()?)
    }

    pub fn find_by_id(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.store.get(id)?)
    }

    pub fn save(&self, item: Item) -> Result<Item> {
        Ok(self.store.put(item)?)
    }

    pub fn delete_by_id(&self, id: ItemId) -> Result<()> {
        Ok(self.store.delete(id)?)
    }

    /// Start a batch over `ids`, or over every stored item when `None`
    pub fn start_batch(&self, ids: Option<Vec<ItemId>>) -> Result<BatchHandle> {
        let ids = match ids {
            Some(ids) => ids,
            None => {
                let ids = self.store.list_all_ids()?;
                debug!(count = ids.len(), "Listed all item ids for batch");
                ids
            }
        };

        let handle = self.coordinator.process_batch(ids)?;
        info!(batch_id = %handle.batch_id(), total = handle.len(), "Batch started");
        Ok(handle)
    }

    /// Start a batch over every stored item
    pub fn process_items_async(&self) -> Result<BatchHandle> {
        self.start_batch(None)
    }

    /// Process every stored item and wait, honoring the configured completion timeout
    pub async fn process_items(&self) -> Result<BatchOutcome> {
        let handle = self.process_items_async()?;
        match self.config.completion_timeout() {
            Some(timeout) => handle.join_timeout(timeout).await,
            None => handle.join().await,
        }
    }

    /// Saved-item count of the last completed batch
    pub fn processed_count(&self) -> usize {
        self.coordinator.last_processed().count
    }

    /// Items saved by the last completed batch
    pub fn processed_items(&self) -> Vec<Item> {
        self.coordinator.last_processed().items.clone()
    }

    pub fn coordinator(&self) -> &BatchCoordinator {
        &self.coordinator
    }
}

impl std::fmt::Debug for ItemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemService")
            .field("coordinator", &self.coordinator)
            .field("config", &self.config)
            .finish()
    }
}
