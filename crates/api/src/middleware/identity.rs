//! Caller identity extractor for Axum handlers.
//!
//! The server sits behind a gateway that authenticates callers and forwards
//! the caller's id in the `x-caller-id` header. Handlers never see requests
//! without it in production; rejecting here covers direct access.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serigraph_core::error::CoreError;
use serigraph_core::types::OwnerId;

use crate::error::AppError;
use crate::state::AppState;

/// Identity of the caller, extracted from the `x-caller-id` header.
///
/// Use this as an extractor parameter in any handler that operates on
/// owner-scoped resources:
///
/// ```ignore
/// async fn my_handler(caller: CallerIdentity) -> AppResult<Json<()>> {
///     tracing::info!(owner_id = %caller.owner_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity {
    /// The caller's owner id. Batches are scoped to this id.
    pub owner_id: OwnerId,
}

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-caller-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing x-caller-id header".into()))
            })?;

        let owner_id = header.parse().map_err(|_| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid x-caller-id header. Expected a UUID".into(),
            ))
        })?;

        Ok(CallerIdentity { owner_id })
    }
}
