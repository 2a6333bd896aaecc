//! # Execution
//!
//! The worker pool and the per-item unit of work it runs.

pub mod task_runner;
pub mod worker_pool;

pub use task_runner::TaskRunner;
pub use worker_pool::{PoolStats, PoolTask, ShutdownReport, WorkerPool};
