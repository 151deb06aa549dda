//! Continuation driver: the write side of the scheduling loop.
//!
//! Each delivered continuation runs the same sequence: status gate, claim
//! the schedule slot, arm the next continuation, then generate and record.
//! Arming before generating is what pipelines the batch: the next item's
//! pacing delay elapses while the current item is being produced.

use serigraph_core::status::BatchStatus;
use serigraph_core::types::JobId;
use serigraph_store::{AdvanceOutcome, BatchJob, ItemResult, RecordOutcome};

use crate::engine::BatchEngine;
use crate::processor::ItemOutcome;
use crate::scheduler::Continuation;

impl BatchEngine {
    /// Process one delivered continuation end to end.
    ///
    /// Never returns an error: every failure mode here is either an
    /// expected race (logged at debug) or an operational fault that must
    /// not kill the runner (logged at error).
    pub async fn process_continuation(&self, continuation: Continuation) {
        let Continuation { job_id, item_index } = continuation;

        // Status gate. Pause and cancel take effect at this boundary; a
        // continuation for a job that is no longer schedulable is dropped,
        // and resume re-arms from the stored index.
        let job = match self.store.get(job_id).await {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(
                    job_id = %job_id,
                    item_index,
                    error = %e,
                    "Dropping continuation: job lookup failed",
                );
                return;
            }
        };
        if !is_schedulable(job.status) {
            tracing::debug!(
                job_id = %job_id,
                item_index,
                status = %job.status,
                "Dropping continuation: job not schedulable",
            );
            return;
        }
        if item_index >= job.total_count {
            tracing::warn!(
                job_id = %job_id,
                item_index,
                total_count = job.total_count,
                "Dropping continuation: item index out of range",
            );
            return;
        }

        if !self.advance_and_schedule(&job, item_index).await {
            return;
        }

        let outcome = self.process_item(&job, item_index).await;
        self.record_outcome(job_id, item_index, outcome).await;
    }

    /// Claim the schedule slot for `item_index` and arm the next
    /// continuation with a fresh pacing delay.
    ///
    /// Returns whether the slot was claimed. An unclaimed slot means this
    /// delivery lost a race (redelivery, or a pause/cancel landed first)
    /// and the caller must not process the item.
    async fn advance_and_schedule(&self, job: &BatchJob, item_index: u32) -> bool {
        match self.store.advance_current_index(job.id, item_index).await {
            Ok(AdvanceOutcome::Advanced) => {
                let next = item_index + 1;
                if next < job.total_count {
                    self.scheduler
                        .schedule_after(
                            Continuation {
                                job_id: job.id,
                                item_index: next,
                            },
                            self.config.pacing.delay(),
                        )
                        .await;
                }
                true
            }
            Ok(AdvanceOutcome::Stale { current }) => {
                tracing::debug!(
                    job_id = %job.id,
                    item_index,
                    current_index = current,
                    "Dropping stale continuation",
                );
                false
            }
            Ok(AdvanceOutcome::Halted { status }) => {
                tracing::debug!(
                    job_id = %job.id,
                    item_index,
                    status = %status,
                    "Dropping continuation: job halted before claim",
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    item_index,
                    error = %e,
                    "Failed to claim schedule slot",
                );
                false
            }
        }
    }

    /// Record an item outcome, logging completion when it closes the batch.
    async fn record_outcome(&self, job_id: JobId, item_index: u32, outcome: ItemOutcome) {
        let result = match outcome {
            ItemOutcome::Completed {
                artifact_id,
                retry_count,
            } => {
                tracing::info!(
                    job_id = %job_id,
                    item_index,
                    artifact_id = %artifact_id,
                    retry_count,
                    "Batch item completed",
                );
                ItemResult::Succeeded { artifact_id }
            }
            ItemOutcome::Failed { reason, retry_count } => {
                tracing::warn!(
                    job_id = %job_id,
                    item_index,
                    retry_count,
                    reason = %reason,
                    "Batch item failed",
                );
                ItemResult::Failed { reason }
            }
            ItemOutcome::Aborted => {
                tracing::debug!(
                    job_id = %job_id,
                    item_index,
                    "Item aborted before generation; nothing to record",
                );
                return;
            }
        };

        match self.store.record_item_result(job_id, item_index, result).await {
            Ok(RecordOutcome::Recorded { job }) => {
                if job.status == BatchStatus::Completed {
                    tracing::info!(
                        job_id = %job_id,
                        completed_count = job.completed_count,
                        failed_count = job.failed_count,
                        "Batch completed",
                    );
                }
            }
            Ok(RecordOutcome::Duplicate) => {
                tracing::debug!(job_id = %job_id, item_index, "Ignoring duplicate item result");
            }
            Ok(RecordOutcome::Terminal { status }) => {
                tracing::debug!(
                    job_id = %job_id,
                    item_index,
                    status = %status,
                    "Dropping item result for terminal job",
                );
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job_id,
                    item_index,
                    error = %e,
                    "Failed to record item result",
                );
            }
        }
    }
}

/// Whether continuations for a job in this status may be claimed.
pub(crate) fn is_schedulable(status: BatchStatus) -> bool {
    matches!(status, BatchStatus::Pending | BatchStatus::Processing)
}
