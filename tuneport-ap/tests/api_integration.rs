//! Integration tests for the tuneport-ap HTTP API
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`:
//! - Health check
//! - Player control and error status codes
//! - Metadata search and autocomplete
//! - SSE status stream

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use helpers::*;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tuneport_ap::api::{create_router, AppContext};
use tuneport_ap::config::PlayerSettings;
use tuneport_ap::providers::{Registry, SearchProvider};
use tuneport_ap::PlayerHandle;

fn setup_router(
    settings: PlayerSettings,
    providers: Vec<Arc<dyn SearchProvider>>,
) -> (axum::Router, PlayerHandle, FakeEngine) {
    let (player, engine) = spawn_player_with(settings);

    let mut registry = Registry::new();
    for provider in providers {
        registry.register_provider(provider).unwrap();
    }
    registry
        .register_completer(Arc::new(StaticCompleter {
            name: "titles",
            suggestions: vec!["Track a", "Track b", "Other"],
        }))
        .unwrap();

    let ctx = AppContext {
        player: player.clone(),
        registry: Arc::new(registry),
        updates_capacity: 16,
    };
    (create_router(ctx), player, engine)
}

fn default_router() -> (axum::Router, PlayerHandle, FakeEngine) {
    setup_router(
        test_settings(),
        vec![Arc::new(StaticProvider::new("stub", chained_tracks()))],
    )
}

/// GET `path` and decode the JSON body, if any
async fn make_request(app: &axum::Router, path: &str) -> (StatusCode, Option<Value>) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };
    (status, body)
}

fn status_text(body: &Option<Value>) -> String {
    body.as_ref()
        .and_then(|v| v["status"].as_str())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _player, _engine) = default_router();

    let (status, body) = make_request(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tuneport-ap");
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn test_status_before_play() {
    let (app, _player, _engine) = default_router();

    let (status, body) = make_request(&app, "/player/status").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["state"], "idle");
    assert_eq!(body["isPlaying"], false);
    assert_eq!(body["volume"], 100);
}

#[tokio::test]
async fn test_play_resolves_through_provider() {
    let (app, player, _engine) = default_router();

    let (status, body) = make_request(&app, "/player/play/stub/a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_text(&body), "ok");

    let snapshot = player.status().unwrap();
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.title, "Track a");

    let (status, body) = make_request(&app, "/player/status").await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["state"], "playing");
    assert_eq!(body["durationSeconds"], 181);
}

#[tokio::test]
async fn test_play_unknown_provider() {
    let (app, _player, engine) = default_router();

    let (status, body) = make_request(&app, "/player/play/nowhere/a").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(status_text(&body).starts_with("error:"));
    assert_eq!(engine.call_count("set_source"), 0);
}

#[tokio::test]
async fn test_play_unknown_track() {
    let (app, _player, _engine) = default_router();

    let (status, _body) = make_request(&app, "/player/play/stub/zzz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_play_missing_id() {
    let (app, _player, _engine) = default_router();

    let (status, _body) = make_request(&app, "/player/play/stub").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_play_timeout_maps_to_gateway_timeout() {
    let settings = PlayerSettings {
        ready_timeout: Duration::from_millis(50),
        ..test_settings()
    };
    let (app, player, engine) = setup_router(
        settings,
        vec![Arc::new(StaticProvider::new("stub", chained_tracks()))],
    );
    engine.never_ready(&stream_url("a"));

    let (status, body) = make_request(&app, "/player/play/stub/a").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(status_text(&body).starts_with("error:"));
    assert!(player.status().unwrap().state.is_stopped());
}

#[tokio::test]
async fn test_control_routes() {
    let (app, player, _engine) = default_router();
    make_request(&app, "/player/play/stub/a").await;

    let (status, _) = make_request(&app, "/player/pause").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!player.status().unwrap().is_playing);

    let (status, _) = make_request(&app, "/player/resume").await;
    assert_eq!(status, StatusCode::OK);
    assert!(player.status().unwrap().is_playing);

    let (status, _) = make_request(&app, "/player/seek/42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player.status().unwrap().elapsed_seconds, 42);

    let (status, _) = make_request(&app, "/player/stop").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player.status().unwrap().elapsed_seconds, 0);
}

#[tokio::test]
async fn test_seek_rejects_garbage() {
    let (app, _player, _engine) = default_router();

    let (status, body) = make_request(&app, "/player/seek/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(status_text(&body).starts_with("error:"));
}

#[tokio::test]
async fn test_volume_routes() {
    let (app, player, engine) = default_router();

    let (status, _) = make_request(&app, "/player/volume/xyz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = make_request(&app, "/player/volume/250").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player.status().unwrap().volume, 100);
    assert_eq!(engine.volume_now(), 100);

    let (status, _) = make_request(&app, "/player/volume/-5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player.status().unwrap().volume, 0);
}

#[tokio::test]
async fn test_current_track_route() {
    let (app, _player, _engine) = default_router();

    let (status, _) = make_request(&app, "/player/track").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    make_request(&app, "/player/play/stub/b").await;

    let (status, body) = make_request(&app, "/player/track").await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["id"], "b");
    assert_eq!(body["next"], "c");
    assert_eq!(body["previous"], "a");
}

#[tokio::test]
async fn test_search_route() {
    let (app, _player, _engine) = default_router();

    let (status, body) = make_request(&app, "/meta/search/track").await;

    assert_eq!(status, StatusCode::OK);
    let results = body.unwrap();
    assert_eq!(results.as_array().unwrap().len(), 3);
    assert_eq!(results[0]["provider"], "stub");
}

#[tokio::test]
async fn test_search_fails_when_any_provider_fails() {
    let (app, _player, _engine) = setup_router(
        test_settings(),
        vec![
            Arc::new(StaticProvider::new("stub", chained_tracks())),
            Arc::new(FailingProvider {
                name: "broken",
                message: "boom",
            }),
        ],
    );

    let (status, body) = make_request(&app, "/meta/search/track").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(status_text(&body).contains("boom"));
}

#[tokio::test]
async fn test_autocomplete_route() {
    let (app, _player, _engine) = default_router();

    let (status, body) = make_request(&app, "/meta/autocomplete/tra").await;

    assert_eq!(status, StatusCode::OK);
    let suggestions: Vec<String> = serde_json::from_value(body.unwrap()).unwrap();
    assert_eq!(suggestions, vec!["Track a", "Track b"]);
}

#[tokio::test]
async fn test_updates_stream_starts_with_current_status() {
    let (app, player, _engine) = default_router();

    let request = Request::builder()
        .uri("/player/updates")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));
    assert_eq!(player.subscriber_count(), 1);

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(1), body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let data = frame.into_data().unwrap();
    let text = String::from_utf8(data.to_vec()).unwrap();

    assert!(text.contains("event: status"));
    assert!(text.contains("\"state\":\"idle\""));
}

#[tokio::test]
async fn test_updates_stream_ends_on_release() {
    let (app, player, _engine) = default_router();

    let request = Request::builder()
        .uri("/player/updates")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    player.release().await.unwrap();

    let body = tokio::time::timeout(
        Duration::from_secs(1),
        axum::body::to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .expect("SSE body still open after release")
    .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("\"state\":\"stopped\""));
}
