//! # Item Store
//!
//! The synchronous persistence collaborator. Implementations must be safe to
//! call from many worker threads at once; the batch processor calls `get` and
//! `put` from inside the worker pool.

pub mod memory;

use crate::error::StoreError;
use crate::models::{Item, ItemId};

pub use memory::InMemoryItemStore;

pub type StoreResult<T> = Result<T, StoreError>;

pub trait ItemStore: Send + Sync + 'static {
    /// Ids of every stored item
    fn list_all_ids(&self) -> StoreResult<Vec<ItemId>>;

    /// Fetch one item; `Ok(None)` when no item has this id
    fn get(&self, id: ItemId) -> StoreResult<Option<Item>>;

    /// Persist an item, returning the stored form
    fn put(&self, item: Item) -> StoreResult<Item>;

    fn find_all(&self) -> StoreResult<Vec<Item>>;

    fn delete(&self, id: ItemId) -> StoreResult<()>;
}
