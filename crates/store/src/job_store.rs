//! The [`JobStore`] trait and its outcome/error types.
//!
//! The scheduler's correctness rests on two operations being atomic:
//! `advance_current_index` (claim the next schedule slot) and
//! `record_item_result` (count an item outcome exactly once). Both return
//! outcome enums rather than errors for their expected races, because a
//! stale continuation or a redelivered result is normal operation, not a
//! failure.

use async_trait::async_trait;
use serigraph_core::status::BatchStatus;
use serigraph_core::types::{JobId, OwnerId};
use uuid::Uuid;

use crate::model::{BatchJob, ItemResult, JobPatch, NewBatchJob};

/// Storage errors. Races that the scheduler expects (stale continuations,
/// duplicate results) are modelled as outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: BatchStatus, to: BatchStatus },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result of trying to claim the next schedule slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The slot was claimed; `current_index` moved forward by one.
    Advanced,
    /// Another delivery of this continuation already claimed the slot.
    Stale { current: u32 },
    /// The job is paused or terminal; nothing may be scheduled or processed.
    Halted { status: BatchStatus },
}

/// Result of recording an item outcome.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// The outcome was counted. Carries the updated job so callers can see
    /// whether this result completed the batch.
    Recorded { job: BatchJob },
    /// This item index was already recorded; nothing changed.
    Duplicate,
    /// The job reached a terminal status first; the result was dropped.
    Terminal { status: BatchStatus },
}

/// Persistence operations for batch jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a job in `pending` with zeroed counters.
    async fn create(&self, new: NewBatchJob) -> Result<BatchJob, StoreError>;

    /// Fetch a job by ID.
    async fn get(&self, job_id: JobId) -> Result<BatchJob, StoreError>;

    /// Apply a partial update atomically.
    ///
    /// When the patch carries a status, the transition is validated against
    /// the status stored at apply time; an illegal move fails with
    /// [`StoreError::InvalidTransition`] and changes nothing.
    async fn patch(&self, job_id: JobId, patch: JobPatch) -> Result<BatchJob, StoreError>;

    /// Claim the schedule slot for item `expected`.
    ///
    /// Succeeds only if the stored `current_index` still equals `expected`
    /// and the job is `pending` or `processing`; on success the index moves
    /// to `expected + 1`. This is the forward-only guard that deduplicates
    /// redelivered continuations.
    async fn advance_current_index(
        &self,
        job_id: JobId,
        expected: u32,
    ) -> Result<AdvanceOutcome, StoreError>;

    /// Record the outcome of item `item_index` exactly once.
    ///
    /// Updates the counters, the artifact list, and the failure reason in
    /// one atomic step; flips `pending -> processing` on the first recorded
    /// result and closes the job as `completed` when every item is
    /// accounted for. Results for already-recorded indices or terminal jobs
    /// are dropped.
    async fn record_item_result(
        &self,
        job_id: JobId,
        item_index: u32,
        result: ItemResult,
    ) -> Result<RecordOutcome, StoreError>;

    /// All jobs belonging to `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<BatchJob>, StoreError>;

    /// Number of non-terminal jobs belonging to `owner_id`.
    async fn count_active(&self, owner_id: OwnerId) -> Result<usize, StoreError>;
}
