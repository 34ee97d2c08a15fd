//! Kickstream engine binary.
//!
//! Wires the event log, broadcast hub, random event source and ticker to
//! the snapshot + push API and runs until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `kickstream-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the player table and event source
//! 4. Seed the event log
//! 5. Start the API server on a background task
//! 6. Run the ticker until Ctrl-C / SIGTERM

mod error;
mod logging;

use std::path::Path;
use std::sync::Arc;

use kickstream_core::config::{DEFAULT_CONFIG_FILE, KickstreamConfig, LoadedConfig};
use kickstream_core::hub::BroadcastHub;
use kickstream_core::log::EventLog;
use kickstream_core::source::RandomEventSource;
use kickstream_core::ticker::{Ticker, seed_log};
use kickstream_server::server::ServerConfig;
use kickstream_server::startup::spawn_server;
use kickstream_server::state::AppState;
use kickstream_types::PlayerDirectory;
use tracing::{info, warn};

use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, event source construction, or
/// server startup fails, or if the server task dies while running.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = Path::new(DEFAULT_CONFIG_FILE);
    let LoadedConfig {
        config,
        file_found,
        ignored_overrides,
    } = KickstreamConfig::load_or_default(config_path).map_err(EngineError::from)?;

    logging::init(&config.logging);

    info!("kickstream-engine starting");
    if !file_found {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    for key in &ignored_overrides {
        warn!(key = %key, "Ignoring malformed numeric environment override");
    }
    info!(
        config_file = %config_path.display(),
        file_found,
        host = config.http.host,
        port = config.http.port,
        tick_interval_ms = config.feed.tick_interval_ms,
        seed_events = config.feed.seed_events,
        subscriber_buffer = config.feed.subscriber_buffer,
        "Configuration loaded"
    );

    run(&config).await.map_err(Into::into)
}

async fn run(config: &KickstreamConfig) -> Result<(), EngineError> {
    let players = Arc::new(PlayerDirectory::builtin());
    let log = Arc::new(EventLog::new());
    let hub = BroadcastHub::new(config.feed.subscriber_buffer);
    let mut source = RandomEventSource::new(&players)?;
    info!(players = players.len(), "Player table loaded");

    let seeded = seed_log(&mut source, &log, config.feed.seed_events).await;
    info!(seeded, "Event log seeded");

    let state = Arc::new(AppState::new(
        Arc::clone(&log),
        hub.clone(),
        Arc::clone(&players),
    ));
    let server_config = ServerConfig {
        host: config.http.host.clone(),
        port: config.http.port,
    };
    let mut server = spawn_server(&server_config, state).await?;
    info!(addr = %server.local_addr, "API server started");

    let ticker = Ticker::new(source, log, Arc::new(hub.clone()), config.feed.tick_interval());

    let outcome = tokio::select! {
        () = ticker.run() => Ok(()),
        joined = &mut server.handle => Err(EngineError::ServerExited {
            message: match joined {
                Ok(()) => String::from("serve loop returned"),
                Err(e) => e.to_string(),
            },
        }),
        () = shutdown_signal() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    let closed = hub.detach_all();
    info!(closed, "Push feed subscribers detached");
    server.handle.abort();
    info!("kickstream-engine shutdown complete");
    outcome
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
