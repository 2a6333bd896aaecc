//! # Error Types
//!
//! Structured error handling for the batch processor using thiserror.
//!
//! Errors are split by blast radius:
//!
//! - [`StoreError`] - raised by an [`ItemStore`](crate::store::ItemStore) call
//! - [`PoolError`] - raised by the worker pool for a single unit of work
//! - [`TaskError`] - the recorded cause of one failed item; always carries the item id
//! - [`ItemProcessorError`] - escalations that affect a whole call (configuration,
//!   a closed pool, a batch whose aggregator vanished)

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::models::ItemId;

/// Error raised by a concrete store backend, passed through unchanged
pub type BackendError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by the record store collaborator
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Store rejected item {item_id}: {message}")]
    Rejected { item_id: ItemId, message: String },

    #[error("Store operation interrupted")]
    Interrupted,

    #[error("Store backend error: {source}")]
    Backend {
        #[source]
        source: BackendError,
    },
}

impl StoreError {
    /// Wrap a backend's own error, keeping it as the `source()` of the chain
    pub fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            source: Arc::new(error),
        }
    }

    /// The backend's original error, for downcasting to its concrete type
    pub fn backend_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Backend { source } => Some(source.as_ref()),
            _ => None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn rejected(item_id: ItemId, message: impl Into<String>) -> Self {
        Self::Rejected {
            item_id,
            message: message.into(),
        }
    }
}

// Backend errors compare by identity; the wrapped error need not be comparable.
impl PartialEq for StoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unavailable { message: a }, Self::Unavailable { message: b }) => a == b,
            (
                Self::Rejected {
                    item_id: a_id,
                    message: a,
                },
                Self::Rejected {
                    item_id: b_id,
                    message: b,
                },
            ) => a_id == b_id && a == b,
            (Self::Interrupted, Self::Interrupted) => true,
            (Self::Backend { source: a }, Self::Backend { source: b }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for StoreError {}

/// Errors produced by the worker pool for a submitted unit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool is shut down")]
    ShutDown,

    #[error("Unit of work panicked: {message}")]
    Panicked { message: String },

    #[error("Unit of work was cancelled by the runtime")]
    Cancelled,
}

/// Store call that a task was making when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Get,
    Put,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOperation::Get => write!(f, "get"),
            StoreOperation::Put => write!(f, "put"),
        }
    }
}

/// Point in the task lifecycle where an interruption was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStage {
    BeforeStart,
    WorkDelay,
    Fetch,
    BeforePersist,
    Persist,
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            TaskStage::BeforeStart => "before_start",
            TaskStage::WorkDelay => "work_delay",
            TaskStage::Fetch => "fetch",
            TaskStage::BeforePersist => "before_persist",
            TaskStage::Persist => "persist",
        };
        f.write_str(stage)
    }
}

/// Cause of a failed item. Every variant names the item it occurred on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Error on item {item_id} during {operation}: {source}")]
    Store {
        item_id: ItemId,
        operation: StoreOperation,
        #[source]
        source: StoreError,
    },

    #[error("Item {item_id} interrupted at {stage}")]
    Interrupted { item_id: ItemId, stage: TaskStage },

    #[error("Item {item_id} panicked: {message}")]
    Panicked { item_id: ItemId, message: String },

    #[error("Item {item_id} could not be scheduled: {source}")]
    PoolUnavailable {
        item_id: ItemId,
        #[source]
        source: PoolError,
    },
}

impl TaskError {
    /// Id of the item this failure belongs to
    pub fn item_id(&self) -> ItemId {
        match self {
            TaskError::Store { item_id, .. }
            | TaskError::Interrupted { item_id, .. }
            | TaskError::Panicked { item_id, .. }
            | TaskError::PoolUnavailable { item_id, .. } => *item_id,
        }
    }

    pub fn is_interruption(&self) -> bool {
        matches!(self, TaskError::Interrupted { .. })
    }

    /// Wrap a pool-level error for the item whose unit produced it
    pub fn from_pool(item_id: ItemId, error: PoolError) -> Self {
        match error {
            PoolError::Panicked { message } => TaskError::Panicked { item_id, message },
            other => TaskError::PoolUnavailable {
                item_id,
                source: other,
            },
        }
    }
}

/// Crate-level errors
#[derive(Error, Debug)]
pub enum ItemProcessorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Worker pool is shut down; batch was not submitted")]
    PoolShutDown,

    #[error("No tokio runtime available: {0}")]
    RuntimeUnavailable(String),

    #[error("Batch {batch_id} was abandoned before completing")]
    BatchAbandoned { batch_id: uuid::Uuid },
}

pub type Result<T> = std::result::Result<T, ItemProcessorError>;
