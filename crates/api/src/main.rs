use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mathviz_anthropic::AnthropicClient;
use mathviz_api::config::{self, ServerConfig};
use mathviz_api::{router, state::AppState};
use mathviz_core::JobStore;
use mathviz_pipeline::artifact::WideningLocator;
use mathviz_pipeline::render::ManimRenderer;
use mathviz_pipeline::{Orchestrator, PipelineConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mathviz_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let pipeline_config = PipelineConfig::from_env();

    // The canonical artifact directory must exist before the first job
    // completes.
    tokio::fs::create_dir_all(&pipeline_config.videos_dir)
        .await
        .expect("Failed to create videos directory");

    // --- Pipeline collaborators ---
    let generator = Arc::new(AnthropicClient::new(config::anthropic_config_from_env()));
    tracing::info!(model = generator.model(), "Generation client ready");

    let renderer = Arc::new(ManimRenderer::new(
        pipeline_config.work_dir.clone(),
        pipeline_config.render_timeout,
    ));
    let locator = Arc::new(WideningLocator::new(
        pipeline_config.media_root.clone(),
        pipeline_config.work_dir.clone(),
        pipeline_config.videos_dir.clone(),
    ));

    // --- Job store and orchestrator ---
    let store = Arc::new(JobStore::new());
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        generator,
        renderer,
        locator,
        pipeline_config,
    ));

    // --- App state and router ---
    let state = AppState {
        store,
        orchestrator,
        config: Arc::new(config.clone()),
    };
    let app = router::build_app_router(state, &config);

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

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
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
