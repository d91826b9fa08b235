use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use firesize_core::config::Config;
use firesize_magick::{Pipeline, ToolRegistry};
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod routes;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub pipeline: Arc<Pipeline>,
}

impl AppContext {
    /// Build a context around an already discovered tool set.
    pub fn new(config: &Config, tools: ToolRegistry) -> Self {
        let pipeline = Pipeline::new(Arc::new(tools), config.pipeline.clone());
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Create the Axum router.
///
/// Everything except `/health` is treated as an image request; the source
/// URL is embedded in the path, so no fixed route can match it.
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .fallback(routes::process_image)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let tools = ToolRegistry::discover(&config.tools);
    for tool in tools.check_all().iter().filter(|t| !t.available) {
        tracing::warn!("{} not found; requests needing it will fail", tool.name);
    }

    let app = create_router(AppContext::new(&config, tools));

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
