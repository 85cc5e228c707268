//! dotsOCR Gateway
//!
//! HTTP API for PDF and image layout recognition backed by the dotsOCR engine.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dots_ocr_gateway::config::Config;
use dots_ocr_gateway::engine::CommandEngine;
use dots_ocr_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "dots_ocr_gateway=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting dotsOCR gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Layout engine: {} {} (model server {}:{}, dpi {})",
        config.engine.program,
        config.engine.args.join(" "),
        config.engine.ip,
        config.engine.port,
        config.engine.dpi
    );
    if let Some(root) = &config.upload.temp_root {
        tracing::info!("Scratch workspaces under {}", root.display());
    }

    let engine = Arc::new(CommandEngine::new(config.engine.clone()));
    let (host, port) = (config.server.host.clone(), config.server.port);

    let app = dots_ocr_gateway::app(AppState::new(config, engine));

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    tracing::info!("dotsOCR gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
