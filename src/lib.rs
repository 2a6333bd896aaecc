#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Item Processor
//!
//! Concurrent batch processing of item records over a bounded worker pool.
//!
//! ## Overview
//!
//! Given a list of item ids, the processor fetches each item, marks it
//! `PROCESSED` and persists it, running at most `capacity` items at a time on a
//! pool shared by every batch. The caller gets a [`BatchHandle`] immediately and
//! the handle resolves exactly once, after every item has an outcome.
//!
//! ## Module Organization
//!
//! - [`models`] - the `Item` record
//! - [`store`] - the synchronous store collaborator and an in-memory store
//! - [`execution`] - the worker pool and the per-item task runner
//! - [`orchestration`] - batch coordinator, handle, result types, bootstrap
//! - [`services`] - request-facing item operations
//! - [`config`] - configuration loading and validation
//! - [`error`] - structured error handling
//! - [`logging`] - tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use item_processor::{InMemoryItemStore, ProcessorConfig, ProcessorSystem};
//!
//! # async fn example() -> item_processor::Result<()> {
//! let store = Arc::new(InMemoryItemStore::seeded(100));
//! let system = ProcessorSystem::bootstrap(ProcessorConfig::from_env()?, store)?;
//!
//! let outcome = system.service().start_batch(None)?.await?;
//! println!("processed {} items", outcome.result().successes().len());
//!
//! system.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod services;
pub mod store;

pub use config::{BatchConfig, ProcessorConfig, WorkerPoolConfig};
pub use error::{
    BackendError, ItemProcessorError, PoolError, Result, StoreError, StoreOperation, TaskError,
    TaskStage,
};
pub use execution::{PoolStats, PoolTask, ShutdownReport, TaskRunner, WorkerPool};
pub use models::{Item, ItemId, NewItem};
pub use orchestration::{
    BatchCoordinator, BatchHandle, BatchOutcome, BatchResult, BatchStatus, BatchSummary,
    ProcessedSnapshot, ProcessorSystem, TaskOutcome,
};
pub use services::ItemService;
pub use store::{InMemoryItemStore, ItemStore, StoreResult};
