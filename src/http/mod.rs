//! # HTTP Surface
//!
//! JSON endpoints over a [`Responder`](crate::Responder) and a
//! [`ResponderManager`](crate::ResponderManager).
//!
//! ```text
//!     GET  /random-response                     ─► respond()        { success, stats }
//!     GET  /random-response/stats               ─► stats()          stats
//!     POST /random-response/reset               ─► reset_manually() stats
//!     GET  /random-response/shards/{key}        ─► respond() for key
//!     GET  /random-response/shards/{key}/stats  ─► stats() for key   (404 if untracked)
//!     POST /random-response/shards/{key}/reset  ─► reset for key     (404 if untracked)
//!     GET  /health                              ─► "ok"
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use windowgate::http::{build_router, AppState};
//! use windowgate::{Responder, ResponderConfig, ResponderManager};
//!
//! # async fn run() -> std::io::Result<()> {
//! let state = AppState::new(
//!     Arc::new(Responder::new()),
//!     Arc::new(ResponderManager::new(ResponderConfig::default())),
//! );
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, build_router(state)).await
//! # }
//! ```

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tracing::info;

mod config;
mod error;
mod routes;

pub use config::ServerConfig;
pub use error::{AppError, ConfigError};

use crate::{Responder, ResponderManager, SharedManager, SharedResponder};
use routes::{
    health_handler, reset_handler, respond_handler, shard_reset_handler, shard_respond_handler,
    shard_stats_handler, stats_handler,
};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The process-wide responder behind `/random-response`.
    pub responder: SharedResponder,
    /// Keyed responders behind `/random-response/shards/{key}`.
    pub shards: SharedManager,
}

impl AppState {
    /// Bundles a responder and a shard manager.
    pub fn new(responder: SharedResponder, shards: SharedManager) -> Self {
        Self { responder, shards }
    }

    /// Builds both components from server settings, using the system clock.
    pub fn from_config(config: &ServerConfig) -> Self {
        let shards = ResponderManager::new(config.responder)
            .with_max_keys(config.max_keys)
            .with_cleanup_settings(config.shard_idle_ms, config.shard_idle_ms);

        Self::new(
            Arc::new(Responder::with_config(config.responder)),
            Arc::new(shards),
        )
    }
}

/// Builds the router with every endpoint wired to `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/random-response", get(respond_handler))
        .route("/random-response/stats", get(stats_handler))
        .route("/random-response/reset", post(reset_handler))
        .route("/random-response/shards/{key}", get(shard_respond_handler))
        .route(
            "/random-response/shards/{key}/stats",
            get(shard_stats_handler),
        )
        .route(
            "/random-response/shards/{key}/reset",
            post(shard_reset_handler),
        )
        .with_state(state)
}

/// Serves the router until Ctrl+C or SIGTERM.
///
/// Also runs the shard cleanup thread for the lifetime of the server.
///
/// # Errors
///
/// Returns I/O errors from binding the listener, spawning the cleanup
/// thread or serving connections.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::from_config(&config);
    let (cleanup_handle, stop_cleanup) = state.shards.clone().start_stoppable_cleanup_thread()?;

    info!(
        "Binding to {} (window: {}ms)",
        config.bind, config.responder.window_ms
    );
    let listener = TcpListener::bind(config.bind).await?;
    info!("Server running on {}", listener.local_addr()?);

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // The thread exits on its own once the sender is gone.
    drop(stop_cleanup);
    if cleanup_handle.join().is_err() {
        tracing::warn!("Cleanup thread panicked");
    }

    info!("Server stopped");
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!("Failed to install terminate handler: {e}");
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
}
