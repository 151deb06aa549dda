//! Batch lifecycle operations: start, pause, resume, cancel.
//!
//! Every operation here is owner-scoped. Status changes are validated
//! twice: once against the loaded snapshot (for a descriptive error) and
//! again by the store inside its atomic patch, which is what actually
//! protects the state machine from races.

use serigraph_core::error::CoreError;
use serigraph_core::limits;
use serigraph_core::params::{self, GenerationParams};
use serigraph_core::status::{self, BatchStatus};
use serigraph_core::types::{JobId, OwnerId};
use serigraph_store::{BatchJob, JobPatch, NewBatchJob};

use crate::engine::{store_err, BatchEngine};
use crate::scheduler::Continuation;

/// Input for starting a batch.
#[derive(Debug, Clone)]
pub struct StartBatch {
    /// Number of items to produce.
    pub count: u32,
    /// Parameter template shared by every item.
    pub params: GenerationParams,
}

impl BatchEngine {
    /// Start a new batch for `owner_id` and arm the first continuation.
    ///
    /// Once this returns, the batch no longer needs the caller: generation
    /// proceeds through scheduled continuations even if the client that
    /// made the request disconnects immediately.
    pub async fn start_batch(
        &self,
        owner_id: OwnerId,
        input: StartBatch,
    ) -> Result<BatchJob, CoreError> {
        limits::validate_batch_size(input.count, self.config.max_batch_size)?;
        params::validate_params(&input.params)?;
        self.entitlements.check_start(owner_id, input.count).await?;

        let job = self
            .store
            .create(NewBatchJob {
                owner_id,
                total_count: input.count,
                generation_params: input.params,
            })
            .await
            .map_err(store_err)?;

        tracing::info!(
            job_id = %job.id,
            owner_id = %owner_id,
            total_count = job.total_count,
            "Batch started",
        );

        self.scheduler
            .schedule_after(
                Continuation {
                    job_id: job.id,
                    item_index: 0,
                },
                self.config.pacing.delay(),
            )
            .await;

        Ok(job)
    }

    /// Pause an active batch.
    ///
    /// Already-armed continuations will fire and drop themselves at the
    /// status gate; an item mid-generation finishes and its result is
    /// still recorded.
    pub async fn pause_batch(&self, owner_id: OwnerId, job_id: JobId) -> Result<BatchJob, CoreError> {
        self.transition(owner_id, job_id, BatchStatus::Paused, "pause").await
    }

    /// Resume a paused batch and re-arm scheduling where it left off.
    pub async fn resume_batch(
        &self,
        owner_id: OwnerId,
        job_id: JobId,
    ) -> Result<BatchJob, CoreError> {
        let job = self
            .transition(owner_id, job_id, BatchStatus::Processing, "resume")
            .await?;

        // Everything at or past current_index still needs scheduling. If a
        // continuation armed before the pause is still in flight it will
        // lose the claim race to the one armed here, or vice versa.
        if job.current_index < job.total_count {
            tracing::debug!(
                job_id = %job.id,
                item_index = job.current_index,
                "Re-arming continuation after resume",
            );
            self.scheduler
                .schedule_after(
                    Continuation {
                        job_id: job.id,
                        item_index: job.current_index,
                    },
                    self.config.pacing.delay(),
                )
                .await;
        }
        Ok(job)
    }

    /// Cancel a batch. Terminal and irreversible; in-flight item results
    /// arriving afterwards are dropped.
    pub async fn cancel_batch(
        &self,
        owner_id: OwnerId,
        job_id: JobId,
    ) -> Result<BatchJob, CoreError> {
        self.transition(owner_id, job_id, BatchStatus::Cancelled, "cancel").await
    }

    // ---- shared helpers ----

    /// Owner-checked status transition.
    async fn transition(
        &self,
        owner_id: OwnerId,
        job_id: JobId,
        to: BatchStatus,
        action: &str,
    ) -> Result<BatchJob, CoreError> {
        let job = self.load_owned(job_id, owner_id, action).await?;
        status::validate_transition(job.status, to)?;

        let updated = self
            .store
            .patch(job.id, JobPatch::status(to))
            .await
            .map_err(store_err)?;

        tracing::info!(
            job_id = %job_id,
            from = %job.status,
            to = %to,
            "Batch status changed",
        );
        Ok(updated)
    }

    /// Fetch a job and verify the caller owns it.
    ///
    /// `action` is used in the error message (e.g. "view", "pause").
    pub(crate) async fn load_owned(
        &self,
        job_id: JobId,
        owner_id: OwnerId,
        action: &str,
    ) -> Result<BatchJob, CoreError> {
        let job = self.store.get(job_id).await.map_err(store_err)?;
        if job.owner_id != owner_id {
            return Err(CoreError::Forbidden(format!(
                "Cannot {action} another user's batch"
            )));
        }
        Ok(job)
    }
}
