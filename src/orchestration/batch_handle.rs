//! # Batch Handle
//!
//! The caller's view of a running batch. The handle resolves exactly once,
//! after every submitted item has an outcome.
//!
//! ```rust,no_run
//! # async fn example(handle: item_processor::BatchHandle) -> item_processor::Result<()> {
//! let outcome = handle.await?;
//! println!("{} items processed", outcome.result().successes().len());
//! # Ok(())
//! # }
//! ```

use std::future::IntoFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::constants::events;
use crate::error::{ItemProcessorError, Result};
use crate::logging::log_batch_operation;
use crate::orchestration::types::{BatchOutcome, BatchState, BatchStatus};

/// Handle to one batch's eventual completion
#[derive(Debug)]
pub struct BatchHandle {
    batch_id: Uuid,
    total: usize,
    state: watch::Receiver<BatchState>,
    progress: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

impl BatchHandle {
    pub(crate) fn new(
        batch_id: Uuid,
        total: usize,
        state: watch::Receiver<BatchState>,
        progress: Arc<AtomicUsize>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            batch_id,
            total,
            state,
            progress,
            cancel,
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Number of submitted ids
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Outcomes recorded so far
    pub fn completed(&self) -> usize {
        self.progress.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> BatchStatus {
        self.state.borrow().status()
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().is_terminal()
    }

    /// Ask every unit of this batch to stop at its next cancellation check
    ///
    /// Outcomes already recorded are kept; the handle still resolves once every
    /// unit has reported.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            log_batch_operation(
                events::BATCH_CANCELLED,
                self.batch_id,
                self.total,
                "cancelling",
                None,
            );
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the batch to finish
    pub async fn join(mut self) -> Result<BatchOutcome> {
        wait_terminal(&mut self.state, self.batch_id).await
    }

    /// Wait up to `timeout`; past it, cancel the batch and collect what remains
    pub async fn join_timeout(mut self, timeout: Duration) -> Result<BatchOutcome> {
        let batch_id = self.batch_id;
        let mut state = self.state.clone();

        match tokio::time::timeout(timeout, wait_terminal(&mut state, batch_id)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    batch_id = %batch_id,
                    completed = self.completed(),
                    total = self.total,
                    timeout_ms = timeout.as_millis() as u64,
                    "Batch timed out - cancelling remaining items"
                );
                self.cancel();
                wait_terminal(&mut self.state, batch_id).await
            }
        }
    }

    /// Block the calling thread until the batch finishes
    ///
    /// For synchronous callers. Calling this from inside an async task blocks
    /// that executor thread; use `join` there instead.
    pub fn wait(self) -> Result<BatchOutcome> {
        futures::executor::block_on(self.join())
    }
}

impl IntoFuture for BatchHandle {
    type Output = Result<BatchOutcome>;
    type IntoFuture = BoxFuture<'static, Result<BatchOutcome>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.join())
    }
}

async fn wait_terminal(
    state: &mut watch::Receiver<BatchState>,
    batch_id: Uuid,
) -> Result<BatchOutcome> {
    let outcome = {
        let current = state
            .wait_for(BatchState::is_terminal)
            .await
            .map_err(|_| ItemProcessorError::BatchAbandoned { batch_id })?;
        match &*current {
            BatchState::Completed(outcome) => Arc::clone(outcome),
            BatchState::Pending | BatchState::Running => {
                return Err(ItemProcessorError::BatchAbandoned { batch_id })
            }
        }
    };

    Ok(Arc::unwrap_or_clone(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::types::BatchResult;

    fn handle_with(state: BatchState) -> (watch::Sender<BatchState>, BatchHandle) {
        let (tx, rx) = watch::channel(state);
        let handle = BatchHandle::new(
            Uuid::new_v4(),
            1,
            rx,
            Arc::new(AtomicUsize::new(0)),
            CancellationToken::new(),
        );
        (tx, handle)
    }

    fn completed(batch_id: Uuid) -> BatchState {
        let result = BatchResult::new(batch_id, 0, chrono::Utc::now()).finish(false);
        BatchState::Completed(Arc::new(BatchOutcome::from_result(result)))
    }

    #[tokio::test]
    async fn resolves_when_terminal_state_is_published() {
        let (tx, handle) = handle_with(BatchState::Running);
        let batch_id = handle.batch_id();
        assert_eq!(handle.status(), BatchStatus::Running);

        let mut join = tokio_test::task::spawn(handle.join());
        tokio_test::assert_pending!(join.poll());

        tx.send_replace(completed(batch_id));
        let outcome = tokio_test::assert_ready!(join.poll()).expect("outcome");
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn dropped_publisher_is_reported_as_abandoned() {
        let (tx, handle) = handle_with(BatchState::Running);
        drop(tx);

        assert!(matches!(
            handle.join().await,
            Err(ItemProcessorError::BatchAbandoned { .. })
        ));
    }

    #[test]
    fn wait_blocks_until_completion_from_another_thread() {
        let (tx, handle) = handle_with(BatchState::Pending);
        let batch_id = handle.batch_id();

        let publisher = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.send_replace(completed(batch_id));
            tx
        });

        let outcome = handle.wait().expect("outcome");
        assert_eq!(outcome.result().batch_id(), batch_id);
        drop(publisher.join().unwrap());
    }

    #[test]
    fn cancel_raises_token_once() {
        let (_tx, handle) = handle_with(BatchState::Running);
        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
