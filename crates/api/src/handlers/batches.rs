//! Handlers for the `/batches` resource.
//!
//! All endpoints require a caller identity via [`CallerIdentity`]; every
//! operation is scoped to the caller's own batches.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serigraph_core::params::GenerationParams;
use serigraph_core::status::BatchStatus;
use serigraph_core::types::{ArtifactId, JobId, Timestamp};
use serigraph_engine::StartBatch;
use serigraph_store::BatchJob;

use crate::error::AppResult;
use crate::middleware::identity::CallerIdentity;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body for starting a batch.
#[derive(Debug, Deserialize)]
pub struct StartBatchRequest {
    /// Number of images to produce.
    pub count: u32,
    /// Parameter template shared by every image in the batch.
    pub params: GenerationParams,
}

/// Query parameters for listing batches.
#[derive(Debug, Default, Deserialize)]
pub struct ListBatchesQuery {
    /// Maximum number of batches to return.
    pub limit: Option<usize>,
}

/// Client-facing view of a batch job.
///
/// Excludes internal bookkeeping (owner id, per-index ledger); progress is
/// exposed through the counters.
#[derive(Debug, Serialize)]
pub struct BatchJobView {
    pub id: JobId,
    pub status: BatchStatus,
    pub total_count: u32,
    pub completed_count: u32,
    pub failed_count: u32,
    pub current_index: u32,
    pub current_item_retry_count: u32,
    pub last_failure_reason: Option<String>,
    pub generation_params: GenerationParams,
    pub image_ids: Vec<ArtifactId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<BatchJob> for BatchJobView {
    fn from(job: BatchJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            total_count: job.total_count,
            completed_count: job.completed_count,
            failed_count: job.failed_count,
            current_index: job.current_index,
            current_item_retry_count: job.current_item_retry_count,
            last_failure_reason: job.last_failure_reason,
            generation_params: job.generation_params,
            image_ids: job.image_ids,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

fn views(jobs: Vec<BatchJob>) -> Vec<BatchJobView> {
    jobs.into_iter().map(BatchJobView::from).collect()
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// POST /api/v1/batches
///
/// Start a new batch. Returns 201 with the created batch in `pending`
/// status; generation proceeds in the background from there, whether or
/// not the caller stays connected.
pub async fn start_batch(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Json(input): Json<StartBatchRequest>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .engine
        .start_batch(
            caller.owner_id,
            StartBatch {
                count: input.count,
                params: input.params,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BatchJobView::from(job),
        }),
    ))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/batches
///
/// List the caller's batches, newest first. Supports an optional `limit`
/// query parameter.
pub async fn list_batches(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Query(params): Query<ListBatchesQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = state
        .engine
        .list_recent_batches(caller.owner_id, params.limit)
        .await?;
    Ok(Json(DataResponse { data: views(jobs) }))
}

/// GET /api/v1/batches/active
///
/// List the caller's batches that are still pending, processing, or paused.
pub async fn list_active_batches(
    caller: CallerIdentity,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let jobs = state.engine.list_active_batches(caller.owner_id).await?;
    Ok(Json(DataResponse { data: views(jobs) }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/batches/{id}
///
/// Get a single batch with its progress counters. Callers can only view
/// their own batches.
pub async fn get_batch(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.engine.get_job(caller.owner_id, job_id).await?;
    Ok(Json(DataResponse {
        data: BatchJobView::from(job),
    }))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/batches/{id}/pause
///
/// Pause an active batch. An image already being generated finishes and
/// is still counted; no new image starts until the batch is resumed.
/// Returns 409 if the batch is in a terminal state.
pub async fn pause_batch(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.engine.pause_batch(caller.owner_id, job_id).await?;
    Ok(Json(DataResponse {
        data: BatchJobView::from(job),
    }))
}

/// POST /api/v1/batches/{id}/resume
///
/// Resume a paused batch from where it left off.
pub async fn resume_batch(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.engine.resume_batch(caller.owner_id, job_id).await?;
    Ok(Json(DataResponse {
        data: BatchJobView::from(job),
    }))
}

/// POST /api/v1/batches/{id}/cancel
///
/// Cancel a batch. Terminal and irreversible; images already produced
/// remain available. Returns 409 if the batch already finished.
pub async fn cancel_batch(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.engine.cancel_batch(caller.owner_id, job_id).await?;
    Ok(Json(DataResponse {
        data: BatchJobView::from(job),
    }))
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// GET /api/v1/batches/{id}/artifacts
///
/// List metadata for the images a batch has produced so far, in
/// completion order. Works on finished and cancelled batches too.
pub async fn list_batch_artifacts(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let records = state
        .engine
        .get_job_artifacts(caller.owner_id, job_id)
        .await?;
    Ok(Json(DataResponse { data: records }))
}
