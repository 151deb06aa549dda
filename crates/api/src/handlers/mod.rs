pub mod artifacts;
pub mod batches;
