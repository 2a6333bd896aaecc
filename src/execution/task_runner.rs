//! # Task Runner
//!
//! Processes a single item: fetch, set the target status, persist. Every path
//! ends in a [`TaskOutcome`]; nothing escapes the runner as an error or panic of
//! its own making.
//!
//! Cancellation is cooperative. The runner checks the batch token before it
//! starts, while it sleeps through the configured work delay, and again before
//! it writes. A store call that reports [`StoreError::Interrupted`] is recorded
//! as an interruption of that item only; the rest of the batch keeps running.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::BatchConfig;
use crate::constants::{events, system};
use crate::error::{StoreError, StoreOperation, TaskError, TaskStage};
use crate::logging::log_item_operation;
use crate::models::ItemId;
use crate::orchestration::types::TaskOutcome;
use crate::store::ItemStore;

/// Turns one item id into one outcome
pub struct TaskRunner {
    store: Arc<dyn ItemStore>,
    target_status: String,
    work_delay: Duration,
}

impl TaskRunner {
    pub fn new(store: Arc<dyn ItemStore>, config: &BatchConfig) -> Self {
        Self {
            store,
            target_status: config.target_status.clone(),
            work_delay: config.work_delay(),
        }
    }

    pub fn target_status(&self) -> &str {
        &self.target_status
    }

    /// Process `item_id`; blocks on store I/O, so call it from a worker thread
    pub fn run(&self, item_id: ItemId, cancel: &CancellationToken) -> TaskOutcome {
        if cancel.is_cancelled() {
            return interrupted(item_id, TaskStage::BeforeStart);
        }

        if !self.work_delay.is_zero() && !sleep_unless_cancelled(self.work_delay, cancel) {
            return interrupted(item_id, TaskStage::WorkDelay);
        }

        let item = match self.store.get(item_id) {
            Ok(Some(item)) => item,
            Ok(None) => {
                log_item_operation(events::ITEM_ABSENT, item_id, "absent", None);
                return TaskOutcome::Absent(item_id);
            }
            Err(e) => return store_failure(item_id, StoreOperation::Get, e),
        };

        if cancel.is_cancelled() {
            return interrupted(item_id, TaskStage::BeforePersist);
        }

        match self.store.put(item.with_status(self.target_status.as_str())) {
            Ok(saved) => {
                debug!(
                    item_id = saved.id,
                    thread = ?std::thread::current().name(),
                    "Item processed"
                );
                log_item_operation(events::ITEM_PROCESSED, saved.id, &saved.status, None);
                TaskOutcome::Success(saved)
            }
            Err(e) => store_failure(item_id, StoreOperation::Put, e),
        }
    }
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("target_status", &self.target_status)
            .field("work_delay", &self.work_delay)
            .finish()
    }
}

fn interrupted(item_id: ItemId, stage: TaskStage) -> TaskOutcome {
    let stage_name = stage.to_string();
    log_item_operation(events::ITEM_FAILED, item_id, "interrupted", Some(&stage_name));
    TaskOutcome::Failure(TaskError::Interrupted { item_id, stage })
}

fn store_failure(
    item_id: ItemId,
    operation: StoreOperation,
    source: StoreError,
) -> TaskOutcome {
    if matches!(source, StoreError::Interrupted) {
        let stage = match operation {
            StoreOperation::Get => TaskStage::Fetch,
            StoreOperation::Put => TaskStage::Persist,
        };
        warn!(
            item_id = item_id,
            operation = %operation,
            "Store call interrupted"
        );
        return interrupted(item_id, stage);
    }

    error!(
        item_id = item_id,
        operation = %operation,
        error = %source,
        "Store call failed"
    );
    let details = source.to_string();
    log_item_operation(events::ITEM_FAILED, item_id, "failed", Some(&details));
    TaskOutcome::Failure(TaskError::Store {
        item_id,
        operation,
        source,
    })
}

/// Sleep for `duration`, waking early if `cancel` fires. Returns false when cancelled.
fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    let poll = Duration::from_millis(system::CANCELLATION_POLL_INTERVAL_MS);
    let deadline = Instant::now() + duration;

    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(poll.min(deadline - now));
    }
}
