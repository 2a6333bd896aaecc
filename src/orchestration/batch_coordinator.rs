//! # Batch Coordinator
//!
//! Fans a list of item ids out over the worker pool and folds the outcomes
//! into one [`BatchResult`].
//!
//! ## Aggregation
//!
//! Every submitted unit yields a [`PoolTask`](crate::execution::PoolTask). The
//! coordinator joins them into a single `FuturesUnordered` stream and hands it
//! to one aggregator task, which is the only owner of the result under
//! construction. Units never touch shared result state, so there is nothing
//! to lock while a batch runs.
//!
//! ```text
//! process_batch(ids) ──→ pool.submit(run(id)) × N ──→ FuturesUnordered
//!        │                                                 │
//!        └─→ BatchHandle ←── watch::Sender ←── aggregator ─┘
//! ```
//!
//! The aggregator publishes the terminal state only after the stream is
//! exhausted, i.e. after every unit has produced an outcome, and it is the
//! only writer of that transition.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::constants::events;
use crate::error::{ItemProcessorError, PoolError, Result, TaskError};
use crate::execution::{TaskRunner, WorkerPool};
use crate::logging::log_batch_operation;
use crate::models::ItemId;
use crate::orchestration::batch_handle::BatchHandle;
use crate::orchestration::types::{
    BatchOutcome, BatchResult, BatchState, ProcessedSnapshot, TaskOutcome,
};

type LastProcessed = Arc<RwLock<Arc<ProcessedSnapshot>>>;

/// Runs batches of items over a shared worker pool
#[derive(Clone)]
pub struct BatchCoordinator {
    pool: WorkerPool,
    runner: Arc<TaskRunner>,
    last_processed: LastProcessed,
}

impl BatchCoordinator {
    pub fn new(pool: WorkerPool, runner: Arc<TaskRunner>) -> Self {
        Self {
            pool,
            runner,
            last_processed: Arc::new(RwLock::new(Arc::new(ProcessedSnapshot::default()))),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Snapshot of the most recently completed batch's saved items
    pub fn last_processed(&self) -> Arc<ProcessedSnapshot> {
        Arc::clone(&self.last_processed.read())
    }

    /// Start processing `ids` and return without waiting
    ///
    /// Duplicate ids are processed once per occurrence. An empty list resolves
    /// immediately. Fails only when the pool is already shut down, in which case
    /// nothing was submitted.
    #[instrument(skip(self, ids), fields(total = ids.len()))]
    pub fn process_batch(&self, ids: Vec<ItemId>) -> Result<BatchHandle> {
        if !self.pool.is_accepting() {
            warn!("Batch refused - worker pool is shut down");
            return Err(ItemProcessorError::PoolShutDown);
        }

        let batch_id = Uuid::new_v4();
        let total = ids.len();
        let cancel = self.pool.child_token();
        let progress = Arc::new(AtomicUsize::new(0));
        let (state_tx, state_rx) = watch::channel(BatchState::Pending);
        let mut result = BatchResult::new(batch_id, total, Utc::now());

        log_batch_operation(events::BATCH_STARTED, batch_id, total, "pending", None);

        let handle = BatchHandle::new(
            batch_id,
            total,
            state_rx,
            Arc::clone(&progress),
            cancel.clone(),
        );

        if ids.is_empty() {
            complete(result, &cancel, &state_tx, &self.last_processed);
            return Ok(handle);
        }

        let mut pending = FuturesUnordered::new();
        for item_id in ids {
            let runner = Arc::clone(&self.runner);
            let token = cancel.clone();
            match self.pool.submit(move || runner.run(item_id, &token)) {
                Ok(task) => pending.push(task.map(move |unit| (item_id, unit))),
                Err(e) => {
                    // Pool closed mid fan-out; account for the id instead of dropping it
                    warn!(batch_id = %batch_id, item_id = item_id, error = %e, "Item not scheduled");
                    result.record(TaskOutcome::Failure(TaskError::from_pool(item_id, e)));
                    progress.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        state_tx.send_replace(BatchState::Running);
        debug!(batch_id = %batch_id, submitted = pending.len(), "Batch fanned out");

        let last_processed = Arc::clone(&self.last_processed);
        self.pool.runtime().spawn(async move {
            while let Some((item_id, unit)) = pending.next().await {
                result.record(outcome_of(item_id, unit));
                progress.fetch_add(1, Ordering::SeqCst);
            }
            complete(result, &cancel, &state_tx, &last_processed);
        });

        Ok(handle)
    }
}

impl std::fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCoordinator")
            .field("pool", &self.pool)
            .field("runner", &self.runner)
            .finish()
    }
}

fn outcome_of(item_id: ItemId, unit: std::result::Result<TaskOutcome, PoolError>) -> TaskOutcome {
    unit.unwrap_or_else(|e| {
        warn!(item_id = item_id, error = %e, "Unit of work failed in the pool");
        TaskOutcome::Failure(TaskError::from_pool(item_id, e))
    })
}

/// Freeze the result, refresh the legacy snapshot, then publish the terminal state
fn complete(
    result: BatchResult,
    cancel: &CancellationToken,
    state: &watch::Sender<BatchState>,
    last_processed: &LastProcessed,
) {
    let result = result.finish(cancel.is_cancelled());
    *last_processed.write() = Arc::new(ProcessedSnapshot::from_result(&result));

    let outcome = BatchOutcome::from_result(result);
    let summary = outcome.result().summary();
    info!(
        batch_id = %summary.batch_id,
        total = summary.total,
        succeeded = summary.succeeded,
        absent = summary.absent,
        failed = summary.failed,
        interrupted = summary.interrupted,
        duration_ms = summary.duration_ms,
        "Batch completed"
    );
    log_batch_operation(
        events::BATCH_COMPLETED,
        summary.batch_id,
        summary.total,
        if outcome.is_success() {
            "all_succeeded"
        } else {
            "completed_with_errors"
        },
        None,
    );

    state.send_replace(BatchState::Completed(Arc::new(outcome)));
}
