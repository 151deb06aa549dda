//! Batch job entity and the mutation DTOs accepted by [`crate::JobStore`].

use std::collections::BTreeSet;

use serigraph_core::params::GenerationParams;
use serigraph_core::status::BatchStatus;
use serigraph_core::types::{ArtifactId, JobId, OwnerId, Timestamp};

/// A batch generation job.
///
/// `current_index` is the next item index to schedule and only ever moves
/// forward. `recorded_items` is the idempotency ledger: an item index enters
/// it exactly once, when its result is first recorded, so redelivered
/// results never double-count.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: JobId,
    pub owner_id: OwnerId,
    pub status: BatchStatus,
    /// Number of items this batch will produce.
    pub total_count: u32,
    /// Next item index to schedule. Ends at `total_count`.
    pub current_index: u32,
    pub completed_count: u32,
    pub failed_count: u32,
    /// Retry count of the most recently retried in-flight item. Reset to
    /// zero whenever an item result is recorded.
    pub current_item_retry_count: u32,
    /// Reason of the most recent per-item failure, for display.
    pub last_failure_reason: Option<String>,
    pub generation_params: GenerationParams,
    /// Artifact IDs of successful items, in completion order.
    pub image_ids: Vec<ArtifactId>,
    /// Item indices whose result has been recorded.
    pub recorded_items: BTreeSet<u32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BatchJob {
    /// Items with a recorded outcome, successful or not.
    pub fn processed_count(&self) -> u32 {
        self.completed_count + self.failed_count
    }
}

/// Input for creating a batch job. The store assigns the ID, timestamps,
/// and zeroed counters.
#[derive(Debug, Clone)]
pub struct NewBatchJob {
    pub owner_id: OwnerId,
    pub total_count: u32,
    pub generation_params: GenerationParams,
}

/// Partial update applied atomically by [`crate::JobStore::patch`].
///
/// A status change is validated against the stored status inside the same
/// atomic step, so a patch computed from a stale read cannot corrupt the
/// state machine.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<BatchStatus>,
    pub current_item_retry_count: Option<u32>,
}

impl JobPatch {
    /// Patch that only moves the job to `status`.
    pub fn status(status: BatchStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Outcome of one item, as reported to the store.
#[derive(Debug, Clone)]
pub enum ItemResult {
    /// The item produced an artifact.
    Succeeded { artifact_id: ArtifactId },
    /// The item failed terminally after its retries were spent.
    Failed { reason: String },
}
