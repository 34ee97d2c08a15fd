//! Error types for the client crate.

use tokio_tungstenite::tungstenite;

/// Errors produced by the snapshot source, the feed connector, the
/// client configuration, or a reconciler handle.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request could not be sent or its body not decoded.
    #[error("http error: {source}")]
    Http {
        /// The underlying reqwest error.
        #[from]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code received.
        status: u16,
    },

    /// The `WebSocket` handshake or transport failed.
    #[error("websocket error: {source}")]
    WebSocket {
        /// The underlying tungstenite error.
        source: Box<tungstenite::Error>,
    },

    /// A connection attempt did not complete in time.
    #[error("connecting to {url} timed out after {timeout_ms}ms")]
    Timeout {
        /// Target URL.
        url: String,
        /// Configured timeout in milliseconds.
        timeout_ms: u128,
    },

    /// A configuration value is missing or malformed.
    #[error("config error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The reconciler task has shut down.
    #[error("reconciler is no longer running")]
    Closed,
}

impl From<tungstenite::Error> for ClientError {
    fn from(source: tungstenite::Error) -> Self {
        Self::WebSocket {
            source: Box::new(source),
        }
    }
}
