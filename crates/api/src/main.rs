use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use serigraph_api::config::ServerConfig;
use serigraph_api::router::build_app_router;
use serigraph_api::state::AppState;
use serigraph_engine::{ActiveBatchLimit, BatchEngine, BatchRunner, EngineConfig, TokioScheduler};
use serigraph_genapi::HttpGenerationClient;
use serigraph_store::{MemoryArtifactStore, MemoryJobStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "serigraph_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Stores ---
    let job_store = Arc::new(MemoryJobStore::new());
    let artifact_store = Arc::new(MemoryArtifactStore::new());

    // --- Generation API client ---
    let generator = Arc::new(HttpGenerationClient::new(config.generation_api_url.clone()));
    tracing::info!(url = %config.generation_api_url, "Generation API client created");

    // --- Scheduler and engine ---
    let (scheduler, continuations) = TokioScheduler::channel();
    let entitlements = Arc::new(ActiveBatchLimit::new(
        Arc::clone(&job_store) as _,
        config.max_active_batches,
    ));
    let engine = Arc::new(BatchEngine::new(
        Arc::clone(&job_store) as _,
        artifact_store as _,
        generator as _,
        scheduler as _,
        entitlements,
        EngineConfig::default(),
    ));

    // --- Batch runner ---
    let runner_cancel = tokio_util::sync::CancellationToken::new();
    let runner = BatchRunner::new(Arc::clone(&engine), continuations);
    let runner_handle = tokio::spawn(runner.run(runner_cancel.clone()));
    tracing::info!("Batch runner started");

    // --- App state ---
    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop the batch runner. In-flight items finish or are abandoned with
    // the process; batches are rebuilt from scratch on the next start.
    runner_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        runner_handle,
    )
    .await;
    tracing::info!("Batch runner stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
