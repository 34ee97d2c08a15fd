//! Axum router construction for the kickstream API.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /events` -- JSON snapshot of the log, or the `WebSocket` push feed
/// - `GET /players` -- player reference table
/// - `GET /health` -- liveness probe
///
/// Unmatched paths get a JSON 404. CORS allows any origin so a browser
/// viewer served from elsewhere can reach the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/events", get(handlers::events))
        .route("/players", get(handlers::players))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
