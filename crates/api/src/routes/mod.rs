pub mod artifacts;
pub mod batches;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /batches                      list, start (GET, POST)
/// /batches/active               list active batches (GET)
/// /batches/{id}                 get batch with progress (GET)
/// /batches/{id}/pause           pause (POST)
/// /batches/{id}/resume          resume (POST)
/// /batches/{id}/cancel          cancel (POST)
/// /batches/{id}/artifacts       list produced images (GET)
///
/// /artifacts/{id}               download image bytes (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Batch lifecycle and progress.
        .nest("/batches", batches::router())
        // Generated image downloads.
        .nest("/artifacts", artifacts::router())
}
