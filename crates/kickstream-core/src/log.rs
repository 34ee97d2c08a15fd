//! Append-only in-memory event log.
//!
//! The log is the single source of truth for everything that has happened
//! since process start. Entries are only ever appended; nothing is evicted,
//! so memory grows for the lifetime of the process.
//!
//! Appends and snapshots take the same [`RwLock`]. A snapshot therefore
//! either contains an in-flight append completely or not at all.

use kickstream_types::Event;
use tokio::sync::RwLock;

/// Ordered, append-only sequence of [`Event`]s.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: RwLock<Vec<Event>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log pre-filled with `events`, in order.
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            entries: RwLock::new(events),
        }
    }

    /// Append one event to the end of the log. Returns the new length.
    pub async fn append(&self, event: Event) -> usize {
        let mut entries = self.entries.write().await;
        entries.push(event);
        entries.len()
    }

    /// Ordered copy of every entry at the instant of the call.
    ///
    /// Later appends do not affect a returned snapshot.
    pub async fn snapshot(&self) -> Vec<Event> {
        self.entries.read().await.clone()
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the log has no entries yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
