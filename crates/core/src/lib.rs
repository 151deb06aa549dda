//! Pure domain logic for the batch generation scheduler.
//!
//! This crate has zero workspace deps so the same rules can be used by the
//! store layer, the engine, and any future worker or CLI tooling. Everything
//! here is synchronous and side-effect free; the only randomness is behind
//! injectable [`rand::Rng`] parameters.

pub mod error;
pub mod limits;
pub mod pacing;
pub mod params;
pub mod status;
pub mod types;

pub use error::CoreError;
