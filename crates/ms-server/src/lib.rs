//! ms-server: HTTP API and background retention sweep.
//!
//! Ties the pipeline crates into a running service:
//!
//! - Axum HTTP API for split-by-size uploads, with OpenAPI docs
//! - Static serving of stored segments
//! - Background retention sweeper
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod sweeper;

use std::net::SocketAddr;
use std::sync::Arc;

use ms_core::config::Config;
use ms_pipeline::RetentionSweeper;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// Start the mediasplit server.
///
/// Discovers tools, builds the [`AppContext`], spawns the retention sweeper
/// and serves HTTP until a shutdown signal arrives. The sweeper is stopped
/// and awaited before this returns.
pub async fn start(config: Config) -> ms_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let storage_dir = config.storage.dir();
    tokio::fs::create_dir_all(&storage_dir).await?;
    tracing::info!("Storage directory {}", storage_dir.display());

    let tools = Arc::new(ms_av::ToolRegistry::discover(&config.tools));
    for info in tools.check_all().await {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("Tool not found: {}", info.name);
        }
    }

    let ctx = AppContext::from_config(config.clone(), tools)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ms_core::Error::Validation(format!("Invalid server address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ms_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    let cancel = CancellationToken::new();

    let sweeper_handle = tokio::spawn(sweeper::run_sweeper(
        RetentionSweeper::from_config(&config),
        config.retention.sweep_interval(),
        config.retention.sweep_on_startup,
        cancel.clone(),
    ));

    let served = serve(listener, ctx, cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = sweeper_handle.await {
        tracing::error!("Retention sweeper panicked: {e}");
    }

    tracing::info!("Server shutdown complete");
    served
}

/// Serve the router on `listener` until a signal arrives or `cancel` fires.
pub async fn serve(
    listener: tokio::net::TcpListener,
    ctx: AppContext,
    cancel: CancellationToken,
) -> ms_core::Result<()> {
    let app = router::build_router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;
    Ok(())
}

/// Wait for SIGINT, SIGTERM or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
