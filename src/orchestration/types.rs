//! # Batch Types
//!
//! Outcomes of individual items and the aggregate a batch resolves to.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::TaskError;
use crate::models::{Item, ItemId};

/// Result of processing one submitted id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success(Item),
    /// No item with this id; not an error
    Absent(ItemId),
    Failure(TaskError),
}

impl TaskOutcome {
    pub fn item_id(&self) -> ItemId {
        match self {
            TaskOutcome::Success(item) => item.id,
            TaskOutcome::Absent(item_id) => *item_id,
            TaskOutcome::Failure(error) => error.item_id(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failure(_))
    }
}

/// Aggregate of every outcome in one batch
///
/// Built by the batch's aggregator only, then frozen. At completion
/// `successes + absent + failures == total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    batch_id: Uuid,
    total: usize,
    successes: Vec<Item>,
    absent: Vec<ItemId>,
    failures: Vec<TaskError>,
    interrupted: bool,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl BatchResult {
    pub(crate) fn new(batch_id: Uuid, total: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            total,
            successes: Vec::with_capacity(total),
            absent: Vec::new(),
            failures: Vec::new(),
            interrupted: false,
            started_at,
            completed_at: started_at,
        }
    }

    pub(crate) fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Success(item) => self.successes.push(item),
            TaskOutcome::Absent(item_id) => self.absent.push(item_id),
            TaskOutcome::Failure(error) => {
                if error.is_interruption() {
                    self.interrupted = true;
                }
                self.failures.push(error);
            }
        }
    }

    pub(crate) fn finish(mut self, cancelled: bool) -> Self {
        self.interrupted |= cancelled;
        self.completed_at = Utc::now();
        self
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Number of ids submitted, duplicates included
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn successes(&self) -> &[Item] {
        &self.successes
    }

    pub fn absent(&self) -> &[ItemId] {
        &self.absent
    }

    pub fn failures(&self) -> &[TaskError] {
        &self.failures
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// True if the batch was cancelled or any item observed an interruption
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn outcome_count(&self) -> usize {
        self.successes.len() + self.absent.len() + self.failures.len()
    }

    pub fn failure_for(&self, item_id: ItemId) -> Option<&TaskError> {
        self.failures.iter().find(|f| f.item_id() == item_id)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn into_successes(self) -> Vec<Item> {
        self.successes
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            batch_id: self.batch_id,
            total: self.total,
            succeeded: self.successes.len(),
            absent: self.absent.len(),
            failed: self.failures.len(),
            interrupted: self.interrupted,
            duration_ms: (self.completed_at - self.started_at)
                .num_milliseconds()
                .max(0),
            failures: self
                .failures
                .iter()
                .map(|f| FailureSummary {
                    item_id: f.item_id(),
                    error: f.to_string(),
                })
                .collect(),
        }
    }
}

/// Serializable digest of a batch result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub absent: usize,
    pub failed: usize,
    pub interrupted: bool,
    pub duration_ms: i64,
    pub failures: Vec<FailureSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub item_id: ItemId,
    pub error: String,
}

/// Terminal state of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    AllSucceeded(BatchResult),
    CompletedWithErrors(BatchResult),
}

impl BatchOutcome {
    pub fn from_result(result: BatchResult) -> Self {
        if result.has_failures() {
            BatchOutcome::CompletedWithErrors(result)
        } else {
            BatchOutcome::AllSucceeded(result)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::AllSucceeded(_))
    }

    pub fn result(&self) -> &BatchResult {
        match self {
            BatchOutcome::AllSucceeded(result) | BatchOutcome::CompletedWithErrors(result) => {
                result
            }
        }
    }

    pub fn into_result(self) -> BatchResult {
        match self {
            BatchOutcome::AllSucceeded(result) | BatchOutcome::CompletedWithErrors(result) => {
                result
            }
        }
    }

    pub fn status(&self) -> BatchStatus {
        match self {
            BatchOutcome::AllSucceeded(_) => BatchStatus::AllSucceeded,
            BatchOutcome::CompletedWithErrors(_) => BatchStatus::CompletedWithErrors,
        }
    }
}

/// Published state of a batch
#[derive(Debug, Clone)]
pub enum BatchState {
    Pending,
    Running,
    Completed(Arc<BatchOutcome>),
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Completed(_))
    }

    pub fn status(&self) -> BatchStatus {
        match self {
            BatchState::Pending => BatchStatus::Pending,
            BatchState::Running => BatchStatus::Running,
            BatchState::Completed(outcome) => outcome.status(),
        }
    }
}

/// Payload-free view of [`BatchState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Running,
    AllSucceeded,
    CompletedWithErrors,
}

/// Items saved by the most recently completed batch
///
/// Kept for callers that read "last processed" state instead of the returned
/// result. Replaced as a whole; never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedSnapshot {
    pub batch_id: Option<Uuid>,
    pub count: usize,
    pub items: Vec<Item>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProcessedSnapshot {
    pub fn from_result(result: &BatchResult) -> Self {
        Self {
            batch_id: Some(result.batch_id),
            count: result.successes.len(),
            items: result.successes.clone(),
            completed_at: Some(result.completed_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreOperation, TaskStage};

    fn item(id: ItemId) -> Item {
        Item::new(id, format!("Item {id}"), None, "PROCESSED", "i@example.com")
    }

    #[test]
    fn absent_is_not_a_failure() {
        let mut result = BatchResult::new(Uuid::new_v4(), 2, Utc::now());
        result.record(TaskOutcome::Success(item(1)));
        result.record(TaskOutcome::Absent(99));
        let result = result.finish(false);

        assert_eq!(result.successes().len(), 1);
        assert_eq!(result.absent(), &[99]);
        assert_eq!(result.outcome_count(), 2);
        assert!(BatchOutcome::from_result(result).is_success());
    }

    #[test]
    fn any_failure_completes_with_errors() {
        let mut result = BatchResult::new(Uuid::new_v4(), 2, Utc::now());
        result.record(TaskOutcome::Success(item(1)));
        result.record(TaskOutcome::Failure(TaskError::Store {
            item_id: 2,
            operation: StoreOperation::Put,
            source: StoreError::unavailable("down"),
        }));
        let outcome = BatchOutcome::from_result(result.finish(false));

        assert_eq!(outcome.status(), BatchStatus::CompletedWithErrors);
        assert!(outcome.result().failure_for(2).is_some());
        assert!(!outcome.result().is_interrupted());
    }

    #[test]
    fn interruption_marks_result() {
        let mut result = BatchResult::new(Uuid::new_v4(), 1, Utc::now());
        result.record(TaskOutcome::Failure(TaskError::Interrupted {
            item_id: 5,
            stage: TaskStage::Fetch,
        }));
        assert!(result.finish(false).is_interrupted());
    }

    #[test]
    fn summary_lists_failures_with_ids() {
        let mut result = BatchResult::new(Uuid::new_v4(), 1, Utc::now());
        result.record(TaskOutcome::Failure(TaskError::Panicked {
            item_id: 8,
            message: "boom".to_string(),
        }));
        let summary = result.finish(false).summary();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].item_id, 8);
        assert!(summary.failures[0].error.contains("boom"));
    }

    #[test]
    fn snapshot_mirrors_successes() {
        let mut result = BatchResult::new(Uuid::new_v4(), 2, Utc::now());
        result.record(TaskOutcome::Success(item(1)));
        result.record(TaskOutcome::Success(item(2)));
        let result = result.finish(false);

        let snapshot = ProcessedSnapshot::from_result(&result);
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.items, result.successes());
        assert_eq!(snapshot.batch_id, Some(result.batch_id()));
    }
}
