//! Client-side stream reconciler.
//!
//! [`StreamReconciler`] is a synchronous state machine. It never performs
//! I/O itself: every input returns the [`Command`]s the driver must carry
//! out, and every network operation it asks for carries a [`Ticket`]. The
//! driver reports the completion back with that ticket. A completion whose
//! ticket is no longer current is stale and is dropped, which is how a
//! stopped or superseded reconciler ignores late results.
//!
//! ```text
//!  Idle --start/retry--> Loading --snapshot ok--> (attach) --ok--> Live
//!   ^                      |                                        |
//!   +---snapshot failed----+                 feed lost / attach err |
//!                                                                   v
//!                          Live <--attach ok-- (attach) <--timer-- Reconnecting
//! ```
//!
//! A snapshot failure returns to `Idle` and waits for an explicit retry.
//! A lost feed schedules exactly one re-attach after a fixed delay and does
//! not re-fetch the snapshot, so events logged during the outage never
//! reach the local view.

use std::time::Duration;

use chrono::{DateTime, Utc};
use kickstream_types::Event;
use tracing::{debug, info, warn};

/// Generation number attached to every requested network operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// The raw generation number.
    pub const fn generation(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for Ticket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle phase of a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not started, or waiting for a retry after a failed snapshot.
    Idle,
    /// Fetching the snapshot or attaching the feed for the first time.
    Loading,
    /// Feed attached; pushed events are being appended.
    Live,
    /// Feed lost; a re-attach is scheduled or in flight.
    Reconnecting,
    /// Retries abandoned by the application. Terminal.
    Failed,
    /// Torn down. Terminal.
    Stopped,
}

impl Phase {
    /// Whether no further transitions can happen.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Live => "live",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Side effect requested from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch the full event log.
    FetchSnapshot(Ticket),
    /// Open a push-feed connection.
    AttachFeed(Ticket),
    /// Call [`StreamReconciler::reconnect_due`] with the ticket after the
    /// delay.
    ScheduleReconnect(Ticket, Duration),
    /// Drop the pending reconnect timer.
    CancelReconnect,
    /// Close the attached feed and any attach in flight.
    CloseFeed,
}

/// What the display layer needs to know about a reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerStatus {
    /// Current phase.
    pub phase: Phase,
    /// Number of events in the local view.
    pub events: usize,
    /// Most recent snapshot or transport error, cleared on recovery.
    pub last_error: Option<String>,
    /// Whether the push feed is attached.
    pub connected: bool,
    /// When the current feed was attached.
    pub connected_since: Option<DateTime<Utc>>,
    /// Feed messages discarded because they did not parse as an event.
    pub malformed_dropped: u64,
}

/// The reconciler state machine. See the module docs.
#[derive(Debug)]
pub struct StreamReconciler {
    phase: Phase,
    generation: u64,
    view: Vec<Event>,
    last_error: Option<String>,
    connected_since: Option<DateTime<Utc>>,
    malformed_dropped: u64,
    reconnect_pending: bool,
    reconnect_delay: Duration,
}

impl StreamReconciler {
    /// A fresh reconciler in [`Phase::Idle`] with an empty view.
    pub const fn new(reconnect_delay: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
            view: Vec::new(),
            last_error: None,
            connected_since: None,
            malformed_dropped: 0,
            reconnect_pending: false,
            reconnect_delay,
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The local view, in arrival order.
    pub fn view(&self) -> &[Event] {
        &self.view
    }

    /// Whether a reconnect timer is outstanding.
    pub const fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Whether `ticket` belongs to the operation currently awaited.
    pub const fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    /// Status summary for the display layer.
    pub fn status(&self) -> ReconcilerStatus {
        ReconcilerStatus {
            phase: self.phase,
            events: self.view.len(),
            last_error: self.last_error.clone(),
            connected: self.connected_since.is_some(),
            connected_since: self.connected_since,
            malformed_dropped: self.malformed_dropped,
        }
    }

    /// Begin loading. Only valid from [`Phase::Idle`].
    pub fn start(&mut self) -> Vec<Command> {
        if self.phase != Phase::Idle {
            debug!(phase = %self.phase, "Start ignored");
            return Vec::new();
        }
        info!("Reconciler starting");
        self.begin_loading()
    }

    /// Fetch the snapshot again after a failure. Only valid from
    /// [`Phase::Idle`]; each call issues exactly one fetch.
    pub fn retry(&mut self) -> Vec<Command> {
        if self.phase != Phase::Idle {
            debug!(phase = %self.phase, "Retry ignored");
            return Vec::new();
        }
        info!("Retrying snapshot fetch");
        self.begin_loading()
    }

    /// The snapshot arrived: seed the view with it and attach the feed.
    pub fn snapshot_loaded(&mut self, ticket: Ticket, events: Vec<Event>) -> Vec<Command> {
        if !self.accepts(ticket, &[Phase::Loading]) {
            return Vec::new();
        }
        info!(events = events.len(), "Snapshot loaded");
        self.view = events;
        self.last_error = None;
        vec![Command::AttachFeed(self.issue())]
    }

    /// The snapshot fetch failed. Back to [`Phase::Idle`] with the error
    /// recorded; nothing is retried until [`retry`](Self::retry).
    pub fn snapshot_failed(&mut self, ticket: Ticket, error: impl Into<String>) -> Vec<Command> {
        if !self.accepts(ticket, &[Phase::Loading]) {
            return Vec::new();
        }
        let error = error.into();
        warn!(%error, "Snapshot fetch failed, waiting for retry");
        self.last_error = Some(error);
        self.phase = Phase::Idle;
        Vec::new()
    }

    /// The feed connection is open.
    pub fn feed_attached(&mut self, ticket: Ticket, at: DateTime<Utc>) -> Vec<Command> {
        if !self.accepts(ticket, &[Phase::Loading, Phase::Reconnecting]) {
            return Vec::new();
        }
        info!(%ticket, events = self.view.len(), "Live feed attached");
        self.phase = Phase::Live;
        self.connected_since = Some(at);
        self.last_error = None;
        Vec::new()
    }

    /// Opening the feed failed. Treated like a lost feed: schedule a
    /// re-attach.
    pub fn feed_attach_failed(&mut self, ticket: Ticket, error: impl Into<String>) -> Vec<Command> {
        if !self.accepts(ticket, &[Phase::Loading, Phase::Reconnecting]) {
            return Vec::new();
        }
        let error = error.into();
        warn!(%error, "Feed attach failed");
        self.last_error = Some(error);
        self.phase = Phase::Reconnecting;
        self.schedule_reconnect()
    }

    /// A text frame arrived on the feed. Returns `true` if it parsed and
    /// was appended to the view.
    ///
    /// No ordering or duplicate check is made against the existing view.
    pub fn feed_message(&mut self, ticket: Ticket, text: &str) -> bool {
        if !self.accepts(ticket, &[Phase::Live]) {
            return false;
        }
        match serde_json::from_str::<Event>(text) {
            Ok(event) => {
                debug!(event_id = %event.id, "Feed event appended");
                self.view.push(event);
                true
            }
            Err(e) => {
                self.malformed_dropped = self.malformed_dropped.saturating_add(1);
                warn!(error = %e, dropped = self.malformed_dropped, "Discarding malformed feed message");
                false
            }
        }
    }

    /// The feed errored or was closed.
    pub fn feed_lost(&mut self, ticket: Ticket, reason: Option<String>) -> Vec<Command> {
        if !self.accepts(ticket, &[Phase::Live]) {
            return Vec::new();
        }
        warn!(
            reason = reason.as_deref().unwrap_or("closed by peer"),
            "Live feed lost"
        );
        self.phase = Phase::Reconnecting;
        self.connected_since = None;
        self.last_error = reason;
        self.schedule_reconnect()
    }

    /// The reconnect timer fired: re-attach the feed without a new
    /// snapshot.
    pub fn reconnect_due(&mut self, ticket: Ticket) -> Vec<Command> {
        if !self.reconnect_pending || !self.accepts(ticket, &[Phase::Reconnecting]) {
            return Vec::new();
        }
        self.reconnect_pending = false;
        info!(events = self.view.len(), "Re-attaching live feed");
        vec![Command::AttachFeed(self.issue())]
    }

    /// Tear down. Cancels the timer, closes the feed, and invalidates every
    /// outstanding ticket. Further inputs have no effect.
    pub fn stop(&mut self) -> Vec<Command> {
        if self.phase == Phase::Stopped {
            return Vec::new();
        }
        let commands = self.teardown();
        self.phase = Phase::Stopped;
        info!("Reconciler stopped");
        commands
    }

    /// Give up for good. Only valid while loading, live, or reconnecting.
    pub fn abandon(&mut self, reason: impl Into<String>) -> Vec<Command> {
        if !matches!(self.phase, Phase::Loading | Phase::Live | Phase::Reconnecting) {
            debug!(phase = %self.phase, "Abandon ignored");
            return Vec::new();
        }
        let commands = self.teardown();
        let reason = reason.into();
        warn!(%reason, "Reconciler abandoned");
        self.phase = Phase::Failed;
        self.last_error = Some(reason);
        commands
    }

    fn begin_loading(&mut self) -> Vec<Command> {
        self.phase = Phase::Loading;
        vec![Command::FetchSnapshot(self.issue())]
    }

    fn schedule_reconnect(&mut self) -> Vec<Command> {
        if self.reconnect_pending {
            debug!("Reconnect already scheduled");
            return Vec::new();
        }
        self.reconnect_pending = true;
        let ticket = self.issue();
        info!(delay_ms = self.reconnect_delay.as_millis(), "Reconnect scheduled");
        vec![Command::ScheduleReconnect(ticket, self.reconnect_delay)]
    }

    fn teardown(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(Command::CancelReconnect);
        }
        if self.phase == Phase::Live {
            commands.push(Command::CloseFeed);
        }
        self.connected_since = None;
        self.issue();
        commands
    }

    fn issue(&mut self) -> Ticket {
        self.generation = self.generation.wrapping_add(1);
        Ticket(self.generation)
    }

    fn accepts(&self, ticket: Ticket, phases: &[Phase]) -> bool {
        if self.is_current(ticket) && phases.contains(&self.phase) {
            return true;
        }
        debug!(%ticket, phase = %self.phase, "Dropping stale completion");
        false
    }
}
