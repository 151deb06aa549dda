#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use serigraph_api::config::ServerConfig;
use serigraph_api::router::build_app_router;
use serigraph_api::state::AppState;
use serigraph_core::pacing::PacingConfig;
use serigraph_engine::{ActiveBatchLimit, BatchEngine, BatchRunner, EngineConfig, TokioScheduler};
use serigraph_genapi::{GenerateError, GeneratedImage, GenerationApi, GenerationRequest, RetryConfig};
use serigraph_store::{MemoryArtifactStore, MemoryJobStore};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        generation_api_url: "http://localhost:8188".to_string(),
        max_active_batches: 4,
    }
}

/// Engine tunables shrunk so batches finish in milliseconds.
fn engine_config() -> EngineConfig {
    EngineConfig {
        pacing: PacingConfig {
            base: Duration::from_millis(1),
            jitter_min: Duration::ZERO,
            jitter_max: Duration::from_millis(1),
        },
        retry: RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            multiplier: 2.0,
        },
        ..EngineConfig::default()
    }
}

/// Generation stub that returns recognizable bytes immediately.
pub struct StubGenerator;

#[async_trait]
impl GenerationApi for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, GenerateError> {
        Ok(GeneratedImage {
            data: vec![0x89, b'P', b'N', b'G', request.seed as u8],
            content_type: "image/png".to_string(),
        })
    }
}

/// Build the full application router with all middleware layers, backed by
/// in-memory stores and a stub generator.
///
/// Mirrors the wiring in `main.rs` (including the entitlement gate and the
/// background runner task) so integration tests exercise the same stack
/// that production uses. Must be called from within a tokio runtime.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(StubGenerator))
}

pub fn build_test_app_with(generator: Arc<dyn GenerationApi>) -> Router {
    let config = test_config();
    let job_store = Arc::new(MemoryJobStore::new());
    let artifact_store = Arc::new(MemoryArtifactStore::new());

    let (scheduler, continuations) = TokioScheduler::channel();
    let entitlements = Arc::new(ActiveBatchLimit::new(
        Arc::clone(&job_store) as _,
        config.max_active_batches,
    ));
    let engine = Arc::new(BatchEngine::new(
        Arc::clone(&job_store) as _,
        artifact_store as _,
        generator,
        scheduler as _,
        entitlements,
        engine_config(),
    ));

    let runner = BatchRunner::new(Arc::clone(&engine), continuations);
    tokio::spawn(runner.run(tokio_util::sync::CancellationToken::new()));

    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET request with the given caller id.
pub async fn get(app: Router, uri: &str, caller: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("x-caller-id", caller)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body and the given caller id.
pub async fn post_json(
    app: Router,
    uri: &str,
    caller: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-caller-id", caller)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a bodyless POST (pause / resume / cancel) with the given caller id.
pub async fn post_empty(app: Router, uri: &str, caller: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-caller-id", caller)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

/// JSON body for a valid start-batch request.
pub fn start_body(count: u32) -> serde_json::Value {
    serde_json::json!({
        "count": count,
        "params": {
            "prompt": "a lighthouse at dusk",
            "model": "sd-test",
            "width": 512,
            "height": 512,
        },
    })
}

/// Poll `GET /api/v1/batches/{id}` until the batch reaches `want`.
pub async fn wait_for_status(
    app: &Router,
    caller: &str,
    batch_id: &str,
    want: &str,
) -> serde_json::Value {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let response = get(app.clone(), &format!("/api/v1/batches/{batch_id}"), caller).await;
            let json = body_json(response).await;
            if json["data"]["status"] == want {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("batch {batch_id} did not reach status {want}"))
}
