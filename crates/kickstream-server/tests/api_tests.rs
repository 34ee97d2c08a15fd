//! Integration tests for the kickstream API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use kickstream_core::hub::BroadcastHub;
use kickstream_core::log::EventLog;
use kickstream_server::router::build_router;
use kickstream_server::state::AppState;
use kickstream_types::{BallId, Event, EventId, EventType, PlayerDirectory, PlayerId};
use serde_json::Value;
use tower::ServiceExt;

fn event(n: u32) -> Event {
    Event {
        id: EventId::generate(),
        ball_id: BallId::new("ball-b"),
        player_id: PlayerId::new(format!("player-{n}")),
        event_type: EventType::Kick,
        speed: 42.5,
        max_height: 3.25,
        spin: f64::from(n) + 500.0,
    }
}

fn make_state(events: Vec<Event>) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(EventLog::with_events(events)),
        BroadcastHub::new(8),
        Arc::new(PlayerDirectory::builtin()),
    ))
}

async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let app = build_router(state);
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn events_returns_log_in_order() {
    let events: Vec<Event> = (1..=3).map(event).collect();
    let (status, body) = get_json(make_state(events.clone()), "/events").await;

    assert_eq!(status, StatusCode::OK);
    let parsed: Vec<Event> = serde_json::from_value(body).unwrap();
    assert_eq!(parsed, events);
}

#[tokio::test]
async fn events_uses_wire_field_names() {
    let (_, body) = get_json(make_state(vec![event(1)]), "/events").await;

    let first = &body[0];
    assert_eq!(first["type"], "Kick");
    assert_eq!(first["ballId"], "ball-b");
    assert_eq!(first["playerId"], "player-1");
    assert_eq!(first["maxHeight"], 3.25);
    assert!(first.get("eventType").is_none());
}

#[tokio::test]
async fn empty_log_is_empty_array() {
    let (status, body) = get_json(make_state(Vec::new()), "/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn players_returns_builtin_roster() {
    let (status, body) = get_json(make_state(Vec::new()), "/players").await;

    assert_eq!(status, StatusCode::OK);
    let players = body.as_array().unwrap();
    assert_eq!(players.len(), 15);
    assert_eq!(players[0]["id"], "player-1");
    assert_eq!(players[0]["firstName"], "Cristiano");
}

#[tokio::test]
async fn health_reports_counts() {
    let state = make_state((1..=4).map(event).collect());
    let _held = state.hub.attach();

    let (status, body) = get_json(state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["eventsCount"], 4);
    assert_eq!(body["playersCount"], 15);
    assert_eq!(body["connectedClients"], 1);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (status, body) = get_json(make_state(Vec::new()), "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert!(body["error"].as_str().unwrap().contains("/nope"));
}

#[tokio::test]
async fn malformed_upgrade_is_json_client_error() {
    let app = build_router(make_state(Vec::new()));
    let response = app
        .oneshot(
            Request::get("/events")
                .header("upgrade", "websocket")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    assert!(status.is_client_error());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], status.as_u16());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = build_router(make_state(Vec::new()));
    let response = app
        .oneshot(
            Request::get("/health")
                .header("origin", "http://viewer.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
