//! Read-side operations: job lookups, listings, and artifact access.
//!
//! Everything here is owner-scoped; the progress counters a caller polls
//! come straight from the stored job, so a `GetBatch` never blocks on the
//! scheduling loop.

use serigraph_core::error::CoreError;
use serigraph_core::types::{ArtifactId, JobId, OwnerId};
use serigraph_store::{ArtifactRecord, BatchJob};

use crate::engine::{store_err, BatchEngine};

/// Default page size for batch listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Maximum page size for batch listing.
pub const MAX_LIST_LIMIT: usize = 100;

impl BatchEngine {
    /// Fetch one batch with its progress counters.
    pub async fn get_job(&self, owner_id: OwnerId, job_id: JobId) -> Result<BatchJob, CoreError> {
        self.load_owned(job_id, owner_id, "view").await
    }

    /// All non-terminal batches for `owner_id`, newest first.
    pub async fn list_active_batches(&self, owner_id: OwnerId) -> Result<Vec<BatchJob>, CoreError> {
        let jobs = self.store.list_by_owner(owner_id).await.map_err(store_err)?;
        Ok(jobs.into_iter().filter(|j| j.status.is_active()).collect())
    }

    /// Recent batches for `owner_id` in any status, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_LIST_LIMIT`] and is capped at
    /// [`MAX_LIST_LIMIT`].
    pub async fn list_recent_batches(
        &self,
        owner_id: OwnerId,
        limit: Option<usize>,
    ) -> Result<Vec<BatchJob>, CoreError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        let mut jobs = self.store.list_by_owner(owner_id).await.map_err(store_err)?;
        jobs.truncate(limit);
        Ok(jobs)
    }

    /// Artifact metadata for a batch's successful items, in completion
    /// order.
    pub async fn get_job_artifacts(
        &self,
        owner_id: OwnerId,
        job_id: JobId,
    ) -> Result<Vec<ArtifactRecord>, CoreError> {
        let job = self.load_owned(job_id, owner_id, "view").await?;
        self.artifacts.resolve(&job.image_ids).await.map_err(store_err)
    }

    /// Fetch one artifact's metadata and bytes, scoped through the owning
    /// job.
    pub async fn get_artifact_data(
        &self,
        owner_id: OwnerId,
        artifact_id: ArtifactId,
    ) -> Result<(ArtifactRecord, Vec<u8>), CoreError> {
        let (record, data) = self
            .artifacts
            .fetch_data(artifact_id)
            .await
            .map_err(store_err)?;

        let job = self.store.get(record.job_id).await.map_err(store_err)?;
        if job.owner_id != owner_id {
            return Err(CoreError::Forbidden(
                "Cannot view another user's artifact".to_string(),
            ));
        }
        Ok((record, data))
    }
}
