//! Single-item processing: seed derivation, generation with bounded
//! retries, artifact storage.
//!
//! Failures are isolated per item. An exhausted retry budget or a
//! terminal API error fails the one item and the batch moves on; nothing
//! here can fail the batch as a whole.

use serigraph_core::params::{self, GenerationParams};
use serigraph_core::types::{ArtifactId, JobId};
use serigraph_genapi::backoff::next_backoff;
use serigraph_genapi::{GenerateError, GeneratedImage, GenerationRequest};
use serigraph_store::{BatchJob, JobPatch, NewArtifact};

use crate::driver::is_schedulable;
use crate::engine::BatchEngine;

/// Outcome of processing a single item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The item produced an artifact. `retry_count` is the number of
    /// retries spent; zero means first-attempt success.
    Completed {
        artifact_id: ArtifactId,
        retry_count: u32,
    },
    /// The item failed terminally.
    Failed { reason: String, retry_count: u32 },
    /// The job stopped being schedulable before generation started;
    /// nothing was produced and nothing should be recorded.
    Aborted,
}

impl BatchEngine {
    /// Generate, store, and classify one item.
    pub(crate) async fn process_item(&self, job: &BatchJob, item_index: u32) -> ItemOutcome {
        // Last status check before paying for a generation call. The gap
        // between the claim and this point is small in-process but real
        // under a durable scheduler.
        match self.store.get(job.id).await {
            Ok(fresh) if is_schedulable(fresh.status) => {}
            Ok(fresh) => {
                tracing::debug!(
                    job_id = %job.id,
                    item_index,
                    status = %fresh.status,
                    "Aborting item: job no longer schedulable",
                );
                return ItemOutcome::Aborted;
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id,
                    item_index,
                    error = %e,
                    "Aborting item: job lookup failed",
                );
                return ItemOutcome::Aborted;
            }
        }

        let seed = params::item_seed(
            job.generation_params.seed_policy,
            item_index,
            &mut rand::rng(),
        );
        let request = build_request(&job.generation_params, seed);

        let mut retry_count: u32 = 0;
        let mut backoff = self.config.retry.initial_backoff;
        let image = loop {
            match self.generate_once(&request).await {
                Ok(image) => break image,
                Err(e) if e.is_retryable() && retry_count < self.config.retry.max_retries => {
                    retry_count += 1;
                    tracing::warn!(
                        job_id = %job.id,
                        item_index,
                        retry_count,
                        max_retries = self.config.retry.max_retries,
                        error = %e,
                        "Retrying item generation",
                    );
                    self.note_retry(job.id, retry_count).await;
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff, &self.config.retry);
                }
                Err(e) => {
                    return ItemOutcome::Failed {
                        reason: e.to_string(),
                        retry_count,
                    };
                }
            }
        };

        let artifact = match self
            .artifacts
            .put(NewArtifact {
                job_id: job.id,
                item_index,
                seed,
                content_type: image.content_type,
                data: image.data,
            })
            .await
        {
            Ok(artifact) => artifact,
            Err(e) => {
                return ItemOutcome::Failed {
                    reason: format!("Failed to store artifact: {e}"),
                    retry_count,
                };
            }
        };

        ItemOutcome::Completed {
            artifact_id: artifact.id,
            retry_count,
        }
    }

    /// One generation call bounded by the per-item deadline.
    async fn generate_once(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerateError> {
        match tokio::time::timeout(self.config.item_timeout, self.generator.generate(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GenerateError::Timeout {
                after: self.config.item_timeout,
            }),
        }
    }

    /// Surface retry progress on the job record. Best effort: a failed
    /// patch only loses the progress display, never the item.
    async fn note_retry(&self, job_id: JobId, retry_count: u32) {
        let patch = JobPatch {
            current_item_retry_count: Some(retry_count),
            ..JobPatch::default()
        };
        if let Err(e) = self.store.patch(job_id, patch).await {
            tracing::debug!(
                job_id = %job_id,
                error = %e,
                "Failed to record retry progress",
            );
        }
    }
}

/// Build the wire request for one item from the batch template.
fn build_request(params: &GenerationParams, seed: u64) -> GenerationRequest {
    GenerationRequest {
        prompt: params.prompt.clone(),
        negative_prompt: params.negative_prompt.clone(),
        model: params.model.clone(),
        width: params.width,
        height: params.height,
        seed,
        steps: params.steps,
        guidance_scale: params.guidance_scale,
    }
}
