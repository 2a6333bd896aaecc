//! # Batch Orchestration
//!
//! Coordinates batches of item processing over the worker pool.
//!
//! - [`batch_coordinator`] - fan-out and single-owner aggregation
//! - [`batch_handle`] - the caller's completion handle
//! - [`bootstrap`] - construction and shutdown of the process-wide pieces
//! - [`types`] - outcomes, results and batch states

pub mod batch_coordinator;
pub mod batch_handle;
pub mod bootstrap;
pub mod types;

pub use batch_coordinator::BatchCoordinator;
pub use batch_handle::BatchHandle;
pub use bootstrap::{ProcessorSystem, SystemStatus};
pub use types::{
    BatchOutcome, BatchResult, BatchState, BatchStatus, BatchSummary, FailureSummary,
    ProcessedSnapshot, TaskOutcome,
};
