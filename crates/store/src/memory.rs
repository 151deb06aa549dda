//! In-memory [`JobStore`] backed by a `RwLock<HashMap>`.
//!
//! Every mutation holds the write lock from read to write, which makes the
//! claim/record operations atomic without any further coordination.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serigraph_core::status::{self, BatchStatus};
use serigraph_core::types::{JobId, OwnerId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::job_store::{AdvanceOutcome, JobStore, RecordOutcome, StoreError};
use crate::model::{BatchJob, ItemResult, JobPatch, NewBatchJob};

/// Process-local job store.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, BatchJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, new: NewBatchJob) -> Result<BatchJob, StoreError> {
        let now = Utc::now();
        let job = BatchJob {
            id: Uuid::now_v7(),
            owner_id: new.owner_id,
            status: BatchStatus::Pending,
            total_count: new.total_count,
            current_index: 0,
            completed_count: 0,
            failed_count: 0,
            current_item_retry_count: 0,
            last_failure_reason: None,
            generation_params: new.generation_params,
            image_ids: Vec::new(),
            recorded_items: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, job_id: JobId) -> Result<BatchJob, StoreError> {
        self.jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "BatchJob",
                id: job_id,
            })
    }

    async fn patch(&self, job_id: JobId, patch: JobPatch) -> Result<BatchJob, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound {
            entity: "BatchJob",
            id: job_id,
        })?;

        if let Some(next) = patch.status {
            if !status::can_transition(job.status, next) {
                return Err(StoreError::InvalidTransition {
                    from: job.status,
                    to: next,
                });
            }
            job.status = next;
        }
        if let Some(retries) = patch.current_item_retry_count {
            job.current_item_retry_count = retries;
        }
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn advance_current_index(
        &self,
        job_id: JobId,
        expected: u32,
    ) -> Result<AdvanceOutcome, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound {
            entity: "BatchJob",
            id: job_id,
        })?;

        if !matches!(job.status, BatchStatus::Pending | BatchStatus::Processing) {
            return Ok(AdvanceOutcome::Halted { status: job.status });
        }
        if job.current_index != expected {
            return Ok(AdvanceOutcome::Stale {
                current: job.current_index,
            });
        }
        job.current_index = expected + 1;
        job.updated_at = Utc::now();
        Ok(AdvanceOutcome::Advanced)
    }

    async fn record_item_result(
        &self,
        job_id: JobId,
        item_index: u32,
        result: ItemResult,
    ) -> Result<RecordOutcome, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound {
            entity: "BatchJob",
            id: job_id,
        })?;

        if job.status.is_terminal() {
            return Ok(RecordOutcome::Terminal { status: job.status });
        }
        if !job.recorded_items.insert(item_index) {
            return Ok(RecordOutcome::Duplicate);
        }

        match result {
            ItemResult::Succeeded { artifact_id } => {
                job.completed_count += 1;
                job.image_ids.push(artifact_id);
            }
            ItemResult::Failed { reason } => {
                job.failed_count += 1;
                job.last_failure_reason = Some(reason);
            }
        }
        job.current_item_retry_count = 0;

        if job.status == BatchStatus::Pending {
            job.status = BatchStatus::Processing;
        }
        if job.processed_count() >= job.total_count {
            job.status = BatchStatus::Completed;
        }
        job.updated_at = Utc::now();
        Ok(RecordOutcome::Recorded { job: job.clone() })
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<BatchJob>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut out: Vec<BatchJob> = jobs
            .values()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        // Newest first; IDs are UUIDv7 so they break created_at ties in
        // creation order.
        out.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(out)
    }

    async fn count_active(&self, owner_id: OwnerId) -> Result<usize, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .filter(|j| j.owner_id == owner_id && j.status.is_active())
            .count())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
