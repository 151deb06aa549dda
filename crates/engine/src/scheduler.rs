//! Delayed continuation scheduling.
//!
//! A [`Continuation`] is the unit of deferred work: "process item N of job
//! J". The scheduler only promises delivery *at least* `delay` later, at
//! least once; the driver deduplicates redeliveries through the store's
//! forward-only index, so a durable delayed-queue implementation can slot
//! in behind the same trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serigraph_core::types::JobId;
use tokio::sync::mpsc;

/// A deferred instruction to process one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub job_id: JobId,
    pub item_index: u32,
}

/// Arms delayed continuations for later delivery to the runner.
#[async_trait]
pub trait ContinuationScheduler: Send + Sync {
    /// Deliver `continuation` after `delay` has elapsed.
    async fn schedule_after(&self, continuation: Continuation, delay: Duration);
}

/// In-process scheduler: one sleeping task per armed continuation,
/// delivered over an mpsc channel to the runner loop.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Continuation>,
}

impl TokioScheduler {
    /// Create the scheduler and the receiving end for a
    /// [`crate::BatchRunner`].
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<Continuation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl ContinuationScheduler for TokioScheduler {
    async fn schedule_after(&self, continuation: Continuation, delay: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(continuation).is_err() {
                tracing::warn!(
                    job_id = %continuation.job_id,
                    item_index = continuation.item_index,
                    "Dropping continuation: runner receiver closed",
                );
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
