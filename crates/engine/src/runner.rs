//! Runner loop consuming delivered continuations.
//!
//! A single long-lived task owns the receiving end of the scheduler
//! channel and spawns one task per delivered continuation, so a slow
//! generation never holds up other jobs' continuations.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::BatchEngine;
use crate::scheduler::Continuation;

/// Consumes continuations and drives them through the engine.
pub struct BatchRunner {
    engine: Arc<BatchEngine>,
    rx: mpsc::UnboundedReceiver<Continuation>,
}

impl BatchRunner {
    pub fn new(engine: Arc<BatchEngine>, rx: mpsc::UnboundedReceiver<Continuation>) -> Self {
        Self { engine, rx }
    }

    /// Run until the cancellation token fires or the channel closes.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Batch runner started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Batch runner shutting down");
                    break;
                }
                delivered = self.rx.recv() => {
                    match delivered {
                        Some(continuation) => {
                            let engine = Arc::clone(&self.engine);
                            tokio::spawn(async move {
                                engine.process_continuation(continuation).await;
                            });
                        }
                        None => {
                            tracing::info!("Batch runner channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }
}
