//! HTTP request handlers for the kickstream API.
//!
//! `GET /events` serves two kinds of client on one path: a plain request
//! gets the full log as a JSON array, while a request carrying
//! `Upgrade: websocket` is handed to the push feed in [`crate::ws`].

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::header::UPGRADE;
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use kickstream_types::{HealthReport, Player};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::ws;

/// Snapshot of the event log, or the push feed when the client asks for
/// a `WebSocket` upgrade.
///
/// # Route
///
/// `GET /events`
pub async fn events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !wants_websocket(&headers) {
        let snapshot = state.log.snapshot().await;
        debug!(count = snapshot.len(), "Serving event snapshot");
        return Json(snapshot).into_response();
    }

    match upgrade {
        Ok(upgrade) => ws::upgrade_feed(upgrade, state),
        Err(rejection) => ApiError::from(rejection).into_response(),
    }
}

/// The static player table.
///
/// # Route
///
/// `GET /players`
pub async fn players(State(state): State<Arc<AppState>>) -> Json<Vec<Player>> {
    Json(state.players.all().to_vec())
}

/// Liveness probe with a few counters.
///
/// # Route
///
/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport::ok(
        state.log.len().await,
        state.players.len(),
        state.hub.subscriber_count(),
    ))
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_owned())
}

fn wants_websocket(headers: &HeaderMap) -> bool {
    headers
        .get(UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"))
}
