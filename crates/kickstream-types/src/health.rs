//! Liveness probe payload.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Response body of `GET /health`.
///
/// Advisory only: the counts are read at slightly different instants and
/// are not a consistent snapshot of the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HealthReport {
    /// Always `"ok"` while the server is answering.
    pub status: String,
    /// Number of events in the log.
    pub events_count: usize,
    /// Number of entries in the player reference table.
    pub players_count: usize,
    /// Number of push-feed subscribers currently attached.
    pub connected_clients: usize,
}

impl HealthReport {
    /// Build an `"ok"` report from the given counts.
    pub fn ok(events_count: usize, players_count: usize, connected_clients: usize) -> Self {
        Self {
            status: String::from("ok"),
            events_count,
            players_count,
            connected_clients,
        }
    }
}
