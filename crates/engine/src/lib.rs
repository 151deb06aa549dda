//! Batch scheduling engine.
//!
//! Owns the full lifecycle of a batch job: creation and state changes
//! ([`controller`]), continuation-driven item scheduling ([`driver`]),
//! per-item generation with retries ([`processor`]), and the read side
//! ([`query`]). Continuations are delivered through the
//! [`scheduler::ContinuationScheduler`] seam and consumed by a
//! [`runner::BatchRunner`] task, so a batch keeps producing after the
//! client that started it has gone away.

pub mod controller;
pub mod driver;
pub mod engine;
pub mod entitlement;
pub mod processor;
pub mod query;
pub mod runner;
pub mod scheduler;

pub use controller::StartBatch;
pub use engine::{BatchEngine, EngineConfig};
pub use entitlement::{ActiveBatchLimit, AllowAll, EntitlementGate};
pub use processor::ItemOutcome;
pub use runner::BatchRunner;
pub use scheduler::{Continuation, ContinuationScheduler, TokioScheduler};
