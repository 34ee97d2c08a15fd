//! Background startup helper used by the engine binary.
//!
//! [`spawn_server`] binds eagerly, so a taken port is reported to the
//! caller instead of surfacing later inside a detached task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the API server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),

    /// The bound listener did not report its local address.
    #[error("could not read local address: {source}")]
    LocalAddr {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// A server running on a background task.
#[derive(Debug)]
pub struct RunningServer {
    /// Address the listener actually bound (resolves port `0`).
    pub local_addr: SocketAddr,
    /// The serving task. Abort it to stop the server.
    pub handle: JoinHandle<()>,
}

/// Bind `config` and serve the API on a background Tokio task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<RunningServer, StartupError> {
    let listener = crate::server::bind(config).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state).await {
            tracing::error!(error = %e, "Kickstream API exited with error");
        }
    });

    tracing::info!(%local_addr, "Kickstream API spawned on background task");

    Ok(RunningServer { local_addr, handle })
}
