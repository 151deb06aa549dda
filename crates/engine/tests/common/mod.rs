#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serigraph_core::pacing::PacingConfig;
use serigraph_core::params::{GenerationParams, SeedPolicy};
use serigraph_engine::{
    AllowAll, BatchEngine, Continuation, ContinuationScheduler, EngineConfig,
};
use serigraph_genapi::{
    GenerateError, GeneratedImage, GenerationApi, GenerationRequest, RetryConfig,
};
use serigraph_store::{MemoryArtifactStore, MemoryJobStore};

/// Seed base used by every test batch, so a scripted generator can recover
/// the item index from the request seed.
pub const BASE_SEED: u64 = 10_000;

/// Params template with a fixed seed policy rooted at [`BASE_SEED`].
pub fn test_params() -> GenerationParams {
    GenerationParams {
        prompt: "weathered brass diving helmet".to_string(),
        negative_prompt: None,
        model: "sd-test".to_string(),
        width: 512,
        height: 512,
        seed_policy: SeedPolicy::Fixed { base: BASE_SEED },
        steps: Some(20),
        guidance_scale: Some(7.0),
    }
}

/// Engine config with delays shrunk so tests never wait on real backoff.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        max_batch_size: 1000,
        pacing: PacingConfig {
            base: Duration::from_millis(2),
            jitter_min: Duration::ZERO,
            jitter_max: Duration::from_millis(1),
        },
        retry: RetryConfig {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            multiplier: 2.0,
        },
        item_timeout: Duration::from_secs(5),
    }
}

// ---------------------------------------------------------------------------
// Manual scheduler
// ---------------------------------------------------------------------------

/// Scheduler that captures armed continuations instead of sleeping.
///
/// Tests drain the captured batch and feed each continuation back through
/// `BatchEngine::process_continuation`, which makes the whole scheduling
/// loop single-stepped and deterministic.
#[derive(Default)]
pub struct ManualScheduler {
    armed: Mutex<Vec<(Continuation, Duration)>>,
}

impl ManualScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take everything armed since the last drain.
    pub fn drain(&self) -> Vec<(Continuation, Duration)> {
        std::mem::take(&mut self.armed.lock().unwrap())
    }

    pub fn armed_len(&self) -> usize {
        self.armed.lock().unwrap().len()
    }
}

#[async_trait]
impl ContinuationScheduler for ManualScheduler {
    async fn schedule_after(&self, continuation: Continuation, delay: Duration) {
        self.armed.lock().unwrap().push((continuation, delay));
    }
}

// ---------------------------------------------------------------------------
// Scripted generator
// ---------------------------------------------------------------------------

/// Behavior of one item index in a [`ScriptedGenerator`].
pub enum ItemScript {
    /// Succeed on the first attempt.
    Ok,
    /// Fail every attempt with a non-retryable error.
    TerminalError(&'static str),
    /// Fail `fail_times` attempts with a retryable error, then succeed.
    FlakyThenOk { fail_times: u32 },
    /// Fail every attempt with a retryable error.
    AlwaysRetryable,
}

/// Generation API fake keyed by item index (recovered from the seed).
pub struct ScriptedGenerator {
    base_seed: u64,
    respond_after: Duration,
    scripts: HashMap<u32, ItemScript>,
    attempts: Mutex<HashMap<u32, u32>>,
}

impl ScriptedGenerator {
    /// Every item succeeds immediately.
    pub fn always_ok() -> Self {
        Self::with_scripts(HashMap::new())
    }

    pub fn with_scripts(scripts: HashMap<u32, ItemScript>) -> Self {
        Self {
            base_seed: BASE_SEED,
            respond_after: Duration::ZERO,
            scripts,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Every item succeeds after sleeping `respond_after`.
    pub fn delayed(respond_after: Duration) -> Self {
        Self {
            respond_after,
            ..Self::always_ok()
        }
    }

    /// Generation attempts made for `index`, retries included.
    pub fn attempts_for(&self, index: u32) -> u32 {
        self.attempts.lock().unwrap().get(&index).copied().unwrap_or(0)
    }
}

/// Recognizable fake image bytes for item `index`.
pub fn fake_image(index: u32) -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', index as u8]
}

#[async_trait]
impl GenerationApi for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, GenerateError> {
        let index = (request.seed - self.base_seed) as u32;
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(index).or_insert(0);
            *entry += 1;
            *entry
        };

        if !self.respond_after.is_zero() {
            tokio::time::sleep(self.respond_after).await;
        }

        let overloaded = || GenerateError::Upstream {
            status: 503,
            body: "scripted overload".to_string(),
        };
        match self.scripts.get(&index) {
            None | Some(ItemScript::Ok) => Ok(GeneratedImage {
                data: fake_image(index),
                content_type: "image/png".to_string(),
            }),
            Some(ItemScript::TerminalError(msg)) => {
                Err(GenerateError::InvalidRequest((*msg).to_string()))
            }
            Some(ItemScript::FlakyThenOk { fail_times }) => {
                if attempt <= *fail_times {
                    Err(overloaded())
                } else {
                    Ok(GeneratedImage {
                        data: fake_image(index),
                        content_type: "image/png".to_string(),
                    })
                }
            }
            Some(ItemScript::AlwaysRetryable) => Err(overloaded()),
        }
    }
}

// ---------------------------------------------------------------------------
// Gated generator
// ---------------------------------------------------------------------------

/// Generator whose calls block until the test releases them, for driving
/// status changes while an item is in flight.
pub struct GateGenerator {
    /// Gains a permit when a generation call starts.
    pub entered: Arc<tokio::sync::Semaphore>,
    /// Generation finishes once the test adds a permit here.
    pub release: Arc<tokio::sync::Semaphore>,
}

impl GateGenerator {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(tokio::sync::Semaphore::new(0)),
            release: Arc::new(tokio::sync::Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl GenerationApi for GateGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, GenerateError> {
        self.entered.add_permits(1);
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|_| GenerateError::Network("gate closed".to_string()))?;
        permit.forget();

        let index = (request.seed - BASE_SEED) as u32;
        Ok(GeneratedImage {
            data: fake_image(index),
            content_type: "image/png".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Engine assembly
// ---------------------------------------------------------------------------

/// Fully wired engine over in-memory stores and a manual scheduler.
pub struct TestEngine {
    pub engine: Arc<BatchEngine>,
    pub store: Arc<MemoryJobStore>,
    pub artifacts: Arc<MemoryArtifactStore>,
    pub scheduler: Arc<ManualScheduler>,
}

pub fn test_engine(generator: Arc<dyn GenerationApi>) -> TestEngine {
    test_engine_with_config(generator, test_config())
}

pub fn test_engine_with_config(
    generator: Arc<dyn GenerationApi>,
    config: EngineConfig,
) -> TestEngine {
    let store = Arc::new(MemoryJobStore::new());
    let artifacts = Arc::new(MemoryArtifactStore::new());
    let scheduler = ManualScheduler::new();
    let engine = Arc::new(BatchEngine::new(
        Arc::clone(&store) as _,
        Arc::clone(&artifacts) as _,
        generator,
        Arc::clone(&scheduler) as _,
        Arc::new(AllowAll),
        config,
    ));
    TestEngine {
        engine,
        store,
        artifacts,
        scheduler,
    }
}

/// Drain and process armed continuations until the scheduler goes quiet.
pub async fn run_to_quiescence(t: &TestEngine) {
    loop {
        let armed = t.scheduler.drain();
        if armed.is_empty() {
            break;
        }
        for (continuation, _delay) in armed {
            t.engine.process_continuation(continuation).await;
        }
    }
}
