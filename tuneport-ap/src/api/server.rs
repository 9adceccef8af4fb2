//! HTTP server setup and routing
//!
//! Sets up the Axum HTTP server with the player control routes, the metadata
//! routes and the SSE status stream.

use crate::error::{Error, Result};
use crate::playback::PlayerHandle;
use crate::providers::Registry;
use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub player: PlayerHandle,
    pub registry: Arc<Registry>,
    /// Per-client buffer of the SSE status stream
    pub updates_capacity: usize,
}

/// Build the router with all routes attached
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))

        // Player control
        .route("/player/play/:provider/:id", get(super::handlers::play))
        .route("/player/pause", get(super::handlers::pause))
        .route("/player/resume", get(super::handlers::resume))
        .route("/player/stop", get(super::handlers::stop))
        .route("/player/seek/:time", get(super::handlers::seek))
        .route("/player/volume/:volume", get(super::handlers::set_volume))

        // Player state
        .route("/player/status", get(super::handlers::status))
        .route("/player/track", get(super::handlers::current_track))
        .route("/player/updates", get(super::sse::player_updates))

        // Metadata
        .route("/meta/search/*query", get(super::handlers::search))
        .route("/meta/autocomplete/*query", get(super::handlers::autocomplete))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until `shutdown` resolves
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
