//! Route definitions for the `/batches` resource.
//!
//! All endpoints require a caller identity.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::batches;
use crate::state::AppState;

/// Routes mounted at `/batches`.
///
/// ```text
/// GET    /                  -> list_batches
/// POST   /                  -> start_batch
/// GET    /active            -> list_active_batches
/// GET    /{id}              -> get_batch
/// POST   /{id}/pause        -> pause_batch
/// POST   /{id}/resume       -> resume_batch
/// POST   /{id}/cancel       -> cancel_batch
/// GET    /{id}/artifacts    -> list_batch_artifacts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(batches::list_batches).post(batches::start_batch))
        .route("/active", get(batches::list_active_batches))
        .route("/{id}", get(batches::get_batch))
        .route("/{id}/pause", post(batches::pause_batch))
        .route("/{id}/resume", post(batches::resume_batch))
        .route("/{id}/cancel", post(batches::cancel_batch))
        .route("/{id}/artifacts", get(batches::list_batch_artifacts))
}
