//! Pre-start entitlement checks.
//!
//! [`EntitlementGate`] runs after input validation and before the job is
//! created. The default gate bounds how many batches a single owner can
//! have active at once; a quota- or billing-backed gate implements the
//! same trait.

use std::sync::Arc;

use async_trait::async_trait;
use serigraph_core::error::CoreError;
use serigraph_core::types::OwnerId;
use serigraph_store::JobStore;

use crate::engine::store_err;

/// Default ceiling on concurrently active batches per owner.
pub const DEFAULT_MAX_ACTIVE_BATCHES: usize = 4;

/// Decides whether an owner may start a batch of `item_count` items.
#[async_trait]
pub trait EntitlementGate: Send + Sync {
    async fn check_start(&self, owner_id: OwnerId, item_count: u32) -> Result<(), CoreError>;
}

/// Bounds the number of non-terminal batches per owner.
pub struct ActiveBatchLimit {
    store: Arc<dyn JobStore>,
    max_active: usize,
}

impl ActiveBatchLimit {
    pub fn new(store: Arc<dyn JobStore>, max_active: usize) -> Self {
        Self { store, max_active }
    }
}

#[async_trait]
impl EntitlementGate for ActiveBatchLimit {
    async fn check_start(&self, owner_id: OwnerId, _item_count: u32) -> Result<(), CoreError> {
        let active = self.store.count_active(owner_id).await.map_err(store_err)?;
        if active >= self.max_active {
            return Err(CoreError::Forbidden(format!(
                "Active batch limit reached ({active} of {} allowed)",
                self.max_active
            )));
        }
        Ok(())
    }
}

/// Gate that admits everything. For tests and single-user deployments.
pub struct AllowAll;

#[async_trait]
impl EntitlementGate for AllowAll {
    async fn check_start(&self, _owner_id: OwnerId, _item_count: u32) -> Result<(), CoreError> {
        Ok(())
    }
}
