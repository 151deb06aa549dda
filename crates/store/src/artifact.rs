//! Generated artifact records and the [`ArtifactStore`] trait.
//!
//! Artifact bytes are opaque to the scheduler. The trait separates metadata
//! lookups from byte fetches so a blob-backed implementation can keep the
//! bytes out of process; the in-memory store keeps them in the map.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serigraph_core::types::{ArtifactId, JobId, Timestamp};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::job_store::StoreError;

/// Metadata for one stored artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    pub job_id: JobId,
    /// Index of the batch item that produced this artifact.
    pub item_index: u32,
    /// Seed the item was generated with.
    pub seed: u64,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: Timestamp,
}

/// Input for storing a freshly generated artifact.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub job_id: JobId,
    pub item_index: u32,
    pub seed: u64,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Storage for generated artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store an artifact and return its record.
    async fn put(&self, new: NewArtifact) -> Result<ArtifactRecord, StoreError>;

    /// Fetch a single artifact's metadata.
    async fn get(&self, id: ArtifactId) -> Result<ArtifactRecord, StoreError>;

    /// Resolve a list of IDs to records, preserving order.
    ///
    /// IDs with no stored artifact are skipped rather than failing the
    /// whole lookup.
    async fn resolve(&self, ids: &[ArtifactId]) -> Result<Vec<ArtifactRecord>, StoreError>;

    /// Fetch an artifact's metadata together with its bytes.
    async fn fetch_data(&self, id: ArtifactId) -> Result<(ArtifactRecord, Vec<u8>), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

struct StoredArtifact {
    record: ArtifactRecord,
    data: Vec<u8>,
}

/// Process-local artifact store holding bytes in the map.
#[derive(Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<ArtifactId, StoredArtifact>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, new: NewArtifact) -> Result<ArtifactRecord, StoreError> {
        let record = ArtifactRecord {
            id: Uuid::now_v7(),
            job_id: new.job_id,
            item_index: new.item_index,
            seed: new.seed,
            content_type: new.content_type,
            size_bytes: new.data.len() as u64,
            created_at: Utc::now(),
        };
        self.artifacts.write().await.insert(
            record.id,
            StoredArtifact {
                record: record.clone(),
                data: new.data,
            },
        );
        Ok(record)
    }

    async fn get(&self, id: ArtifactId) -> Result<ArtifactRecord, StoreError> {
        self.artifacts
            .read()
            .await
            .get(&id)
            .map(|a| a.record.clone())
            .ok_or(StoreError::NotFound {
                entity: "Artifact",
                id,
            })
    }

    async fn resolve(&self, ids: &[ArtifactId]) -> Result<Vec<ArtifactRecord>, StoreError> {
        let artifacts = self.artifacts.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| artifacts.get(id).map(|a| a.record.clone()))
            .collect())
    }

    async fn fetch_data(&self, id: ArtifactId) -> Result<(ArtifactRecord, Vec<u8>), StoreError> {
        self.artifacts
            .read()
            .await
            .get(&id)
            .map(|a| (a.record.clone(), a.data.clone()))
            .ok_or(StoreError::NotFound {
                entity: "Artifact",
                id,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
