//! Shared application state for the API server.
//!
//! [`AppState`] bundles the three things every handler needs: the event
//! log to snapshot, the broadcast hub to attach push subscribers to, and
//! the immutable player table.

use std::sync::Arc;

use kickstream_core::hub::BroadcastHub;
use kickstream_core::log::EventLog;
use kickstream_types::PlayerDirectory;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The append-only event log (read-only from the server's side).
    pub log: Arc<EventLog>,
    /// Registry of push-feed subscribers.
    pub hub: BroadcastHub,
    /// Static player reference table.
    pub players: Arc<PlayerDirectory>,
}

impl AppState {
    /// Assemble state from its parts.
    pub const fn new(log: Arc<EventLog>, hub: BroadcastHub, players: Arc<PlayerDirectory>) -> Self {
        Self { log, hub, players }
    }
}

impl Default for AppState {
    /// Empty log, default hub buffer, built-in roster.
    fn default() -> Self {
        Self::new(
            Arc::new(EventLog::new()),
            BroadcastHub::default(),
            Arc::new(PlayerDirectory::builtin()),
        )
    }
}
