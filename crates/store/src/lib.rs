//! Storage layer for batch jobs and their generated artifacts.
//!
//! [`JobStore`] and [`ArtifactStore`] are async traits so the engine can run
//! against the in-memory implementations here or a database-backed pair
//! later. The atomicity contract matters more than the backing medium: a
//! conforming [`JobStore`] must apply `advance_current_index` and
//! `record_item_result` as single atomic read-modify-writes. The in-memory
//! stores get this by holding a write lock for the whole mutation.

pub mod artifact;
pub mod job_store;
pub mod memory;
pub mod model;

pub use artifact::{ArtifactRecord, ArtifactStore, MemoryArtifactStore, NewArtifact};
pub use job_store::{AdvanceOutcome, JobStore, RecordOutcome, StoreError};
pub use memory::MemoryJobStore;
pub use model::{BatchJob, ItemResult, JobPatch, NewBatchJob};
