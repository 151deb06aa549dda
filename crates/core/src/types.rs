//! Shared ID and timestamp aliases.

/// Batch job identifier. Generated as UUIDv7 so IDs sort by creation time.
pub type JobId = uuid::Uuid;

/// Identifier of the user who owns a batch job.
pub type OwnerId = uuid::Uuid;

/// Identifier of a stored generated artifact.
pub type ArtifactId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
