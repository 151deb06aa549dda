//! Handlers for the `/artifacts` resource.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use serigraph_core::types::ArtifactId;

use crate::error::AppResult;
use crate::middleware::identity::CallerIdentity;
use crate::state::AppState;

/// GET /api/v1/artifacts/{id}
///
/// Download one generated image. The response body is the raw image bytes
/// with the stored content type. Callers can only download artifacts
/// belonging to their own batches.
pub async fn download_artifact(
    caller: CallerIdentity,
    State(state): State<AppState>,
    Path(artifact_id): Path<ArtifactId>,
) -> AppResult<impl IntoResponse> {
    let (record, data) = state
        .engine
        .get_artifact_data(caller.owner_id, artifact_id)
        .await?;

    Ok(([(header::CONTENT_TYPE, record.content_type)], data))
}
