//! Error types for the API layer.
//!
//! [`ApiError`] unifies request failures into a single enum that converts
//! into a JSON error response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while answering a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No route matches the request path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request asked for a `WebSocket` upgrade but could not be
    /// upgraded.
    #[error("websocket upgrade rejected: {0}")]
    Upgrade(#[from] WebSocketUpgradeRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(path) => (StatusCode::NOT_FOUND, format!("no route for {path}")),
            Self::Upgrade(rejection) => (rejection.status(), rejection.body_text()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
