//! The [`BatchEngine`] aggregate and its configuration.

use std::sync::Arc;
use std::time::Duration;

use serigraph_core::error::CoreError;
use serigraph_core::limits::MAX_BATCH_SIZE;
use serigraph_core::pacing::PacingConfig;
use serigraph_genapi::{GenerationApi, RetryConfig};
use serigraph_store::{ArtifactStore, JobStore, StoreError};

use crate::entitlement::EntitlementGate;
use crate::scheduler::ContinuationScheduler;

/// Deadline for a single generation call, including the time the API
/// spends queueing the request.
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(60);

/// Engine tunables. Defaults are the production values; tests shrink the
/// delays to keep wall-clock time down.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ceiling on items per batch, at most [`MAX_BATCH_SIZE`].
    pub max_batch_size: u32,
    pub pacing: PacingConfig,
    pub retry: RetryConfig,
    /// Per-attempt generation deadline.
    pub item_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: MAX_BATCH_SIZE,
            pacing: PacingConfig::default(),
            retry: RetryConfig::default(),
            item_timeout: DEFAULT_ITEM_TIMEOUT,
        }
    }
}

/// All batch operations hang off this aggregate. Wrapped in an `Arc` and
/// shared between the HTTP handlers and the runner task.
pub struct BatchEngine {
    pub(crate) store: Arc<dyn JobStore>,
    pub(crate) artifacts: Arc<dyn ArtifactStore>,
    pub(crate) generator: Arc<dyn GenerationApi>,
    pub(crate) scheduler: Arc<dyn ContinuationScheduler>,
    pub(crate) entitlements: Arc<dyn EntitlementGate>,
    pub(crate) config: EngineConfig,
}

impl BatchEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        artifacts: Arc<dyn ArtifactStore>,
        generator: Arc<dyn GenerationApi>,
        scheduler: Arc<dyn ContinuationScheduler>,
        entitlements: Arc<dyn EntitlementGate>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            artifacts,
            generator,
            scheduler,
            entitlements,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Map store failures onto the shared error taxonomy.
pub(crate) fn store_err(err: StoreError) -> CoreError {
    match err {
        StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
        StoreError::InvalidTransition { from, to } => {
            CoreError::Conflict(format!("Invalid status transition: {from} -> {to}"))
        }
        StoreError::Backend(msg) => CoreError::Internal(msg),
    }
}
