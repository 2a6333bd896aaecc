//! # Models
//!
//! Record types handled by the store and the batch processor.

pub mod item;

pub use item::{Item, ItemId, NewItem};
