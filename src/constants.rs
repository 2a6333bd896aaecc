//! # System Constants
//!
//! Defaults and well-known values shared by configuration, the worker pool and
//! the batch coordinator.

/// Item status values
pub mod status {
    pub const NEW: &str = "NEW";
    pub const PROCESSED: &str = "PROCESSED";
}

/// Operational defaults
pub mod system {
    /// Concurrent units the worker pool runs when not configured otherwise
    pub const DEFAULT_POOL_CAPACITY: usize = 10;
    pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 30_000;
    /// Granularity of cancellation checks while a task sleeps
    pub const CANCELLATION_POLL_INTERVAL_MS: u64 = 10;
    /// Prefix for environment overrides, e.g. `ITEM_PROCESSOR__WORKER_POOL__CAPACITY`
    pub const ENV_PREFIX: &str = "ITEM_PROCESSOR";
    pub const ENV_SEPARATOR: &str = "__";
}

/// Batch lifecycle events used as log operation names
pub mod events {
    pub const BATCH_STARTED: &str = "batch.started";
    pub const BATCH_COMPLETED: &str = "batch.completed";
    pub const BATCH_CANCELLED: &str = "batch.cancelled";
    pub const ITEM_PROCESSED: &str = "item.processed";
    pub const ITEM_ABSENT: &str = "item.absent";
    pub const ITEM_FAILED: &str = "item.failed";
}
