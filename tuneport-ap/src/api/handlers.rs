//! HTTP request handlers
//!
//! Control routes answer `{"status": "ok"}` once the player has applied the
//! command. Failures answer `{"status": "error: ..."}` with a status code
//! chosen by the error kind.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::providers::play_from_provider;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};
use tuneport_common::Track;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    subscribers: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// HTTP status code for an error kind
pub fn status_code_for(e: &Error) -> StatusCode {
    match e {
        Error::CommandTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::UnknownCollaborator(_) | Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::ActorClosed => StatusCode::SERVICE_UNAVAILABLE,
        Error::EngineCallFailed { .. }
        | Error::AggregateFailure(_)
        | Error::Config(_)
        | Error::Http(_)
        | Error::Io(_)
        | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(e: Error) -> ApiError {
    let code = status_code_for(&e);
    if code.is_server_error() {
        error!("Request failed: {}", e);
    }
    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "tuneport-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subscribers: ctx.player.subscriber_count(),
    })
}

// ============================================================================
// Player Control
// ============================================================================

/// GET /player/play/:provider/:id - Resolve a track and play it
pub async fn play(
    State(ctx): State<AppContext>,
    Path((provider, id)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    info!(provider = %provider, id = %id, "Play request");
    play_from_provider(&ctx.registry, &ctx.player, &provider, &id)
        .await
        .map_err(api_error)?;
    Ok(ok())
}

/// GET /player/pause - Pause playback
pub async fn pause(State(ctx): State<AppContext>) -> Result<Json<StatusResponse>, ApiError> {
    ctx.player.pause().await.map_err(api_error)?;
    Ok(ok())
}

/// GET /player/resume - Resume playback
pub async fn resume(State(ctx): State<AppContext>) -> Result<Json<StatusResponse>, ApiError> {
    ctx.player.resume().await.map_err(api_error)?;
    Ok(ok())
}

/// GET /player/stop - Stop playback
pub async fn stop(State(ctx): State<AppContext>) -> Result<Json<StatusResponse>, ApiError> {
    ctx.player.stop().await.map_err(api_error)?;
    Ok(ok())
}

/// GET /player/seek/:time - Seek to an absolute position in seconds
pub async fn seek(
    State(ctx): State<AppContext>,
    Path(time): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let seconds: u64 = time
        .parse()
        .map_err(|_| api_error(Error::BadRequest(format!("Invalid seek time: {}", time))))?;
    ctx.player.seek(seconds).await.map_err(api_error)?;
    Ok(ok())
}

/// GET /player/volume/:volume - Set volume (clamped to 0-100)
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Path(volume): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let level: i32 = volume
        .parse()
        .map_err(|_| api_error(Error::BadRequest(format!("Invalid volume: {}", volume))))?;
    ctx.player.set_volume(level).await.map_err(api_error)?;
    Ok(ok())
}

// ============================================================================
// Player State
// ============================================================================

/// GET /player/status - Last published status snapshot
///
/// 204 when the player has not published anything yet.
pub async fn status(State(ctx): State<AppContext>) -> Response {
    match ctx.player.status() {
        Some(status) => Json(status).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /player/track - Track of the last successful play
pub async fn current_track(State(ctx): State<AppContext>) -> Result<Json<Track>, ApiError> {
    ctx.player
        .current_track()
        .map(Json)
        .ok_or_else(|| api_error(Error::NotFound("No track has been played".to_string())))
}

// ============================================================================
// Metadata
// ============================================================================

/// GET /meta/search/*query - Search every provider
pub async fn search(
    State(ctx): State<AppContext>,
    Path(query): Path<String>,
) -> Result<Json<Vec<Track>>, ApiError> {
    let tracks = ctx
        .registry
        .search(&query)
        .await
        .into_result()
        .map_err(api_error)?;
    Ok(Json(tracks))
}

/// GET /meta/autocomplete/*query - Suggestions from every completion source
pub async fn autocomplete(
    State(ctx): State<AppContext>,
    Path(query): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let suggestions = ctx
        .registry
        .autocomplete(&query)
        .await
        .into_result()
        .map_err(api_error)?;
    Ok(Json(suggestions))
}
