use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use super::{ItemStore, StoreResult};
use crate::models::{Item, ItemId, NewItem};

/// Concurrent in-memory store backed by a sharded map
#[derive(Debug)]
pub struct InMemoryItemStore {
    items: DashMap<ItemId, Item>,
    next_id: AtomicI64,
}

impl Default for InMemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store a new item under the next generated id
    pub fn insert(&self, new_item: NewItem) -> Item {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = new_item.into_item(id);
        self.items.insert(id, item.clone());
        item
    }

    /// Seed `count` items named `Item N`
    pub fn seeded(count: usize) -> Self {
        let store = Self::new();
        for n in 1..=count {
            store.insert(
                NewItem::new(format!("Item {n}"), format!("item{n}@example.com"))
                    .with_description(format!("Seeded item {n}")),
            );
        }
        store
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemStore for InMemoryItemStore {
    fn list_all_ids(&self) -> StoreResult<Vec<ItemId>> {
        let mut ids: Vec<ItemId> = self.items.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn get(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.items.get(&id).map(|entry| entry.value().clone()))
    }

    fn put(&self, item: Item) -> StoreResult<Item> {
        // Keep generated ids ahead of explicitly stored ones
        self.next_id.fetch_max(item.id + 1, Ordering::SeqCst);
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn find_all(&self) -> StoreResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_unstable_by_key(|item| item.id);
        Ok(items)
    }

    fn delete(&self, id: ItemId) -> StoreResult<()> {
        self.items.remove(&id);
        Ok(())
    }
}
