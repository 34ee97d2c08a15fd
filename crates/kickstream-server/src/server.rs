//! HTTP server lifecycle.
//!
//! [`bind`] and [`serve`] are split so callers (and tests) can bind an
//! ephemeral port and learn the real address before serving starts.
//! [`start_server`] does both in one call.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Listen address for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on. `0` picks an ephemeral port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8888,
        }
    }
}

impl ServerConfig {
    /// Parse `host:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address {}:{}: {e}", self.host, self.port)))
    }
}

/// Bind the listener for `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is malformed or the port
/// cannot be bound.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.socket_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the API on an already bound listener until the task is dropped
/// or the listener fails.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    let router = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Kickstream API listening");
        info!("  GET  http://{addr}/events   (JSON snapshot)");
        info!("  WS   ws://{addr}/events     (push feed)");
        info!("  GET  http://{addr}/players");
        info!("  GET  http://{addr}/health");
    }

    axum::serve(listener, router)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}

/// Bind and serve in one call.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}

/// Errors that can occur when starting or running the API server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_host() {
        let config = ServerConfig {
            host: String::from("not a host"),
            port: 8888,
        };
        assert!(matches!(config.socket_addr(), Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn ephemeral_port_binds() {
        let config = ServerConfig {
            host: String::from("127.0.0.1"),
            port: 0,
        };
        let listener = bind(&config).await;
        assert!(listener.is_ok_and(|l| l.local_addr().is_ok_and(|a| a.port() != 0)));
    }
}
