//! Fan-out of freshly logged events to attached push-feed subscribers.
//!
//! The [`BroadcastHub`] keeps an explicit registry of subscribers. Each
//! subscriber owns a bounded queue; [`publish`](BroadcastHub::publish)
//! enqueues without waiting, so one stalled peer can never hold up the
//! tick cycle. A subscriber whose queue is full or closed is detached on
//! the spot and the remaining subscribers still receive the event.
//!
//! Each publish works from a copy of the registry taken under the lock.
//! A subscriber attached while a publish is running may or may not see
//! that event. A subscriber that has been detached never yields another
//! event, even if one was already queued for it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use kickstream_types::Event;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::ticker::EventSink;

/// Handle identity of one attached subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// The raw numeric id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Registry entry: transport half plus liveness flag.
#[derive(Clone)]
struct Slot {
    tx: mpsc::Sender<Arc<Event>>,
    live: Arc<AtomicBool>,
}

#[derive(Default)]
struct Registry {
    slots: Mutex<HashMap<SubscriberId, Slot>>,
    next_id: AtomicU64,
}

impl Registry {
    fn slots(&self) -> MutexGuard<'_, HashMap<SubscriberId, Slot>> {
        // Critical sections never panic midway, so a poisoned map is intact.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.slots().remove(&id);
        if let Some(slot) = &removed {
            slot.live.store(false, Ordering::Release);
        }
        removed.is_some()
    }
}

/// Outcome of a single [`BroadcastHub::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the event was queued for.
    pub delivered: usize,
    /// Subscribers detached because their queue was full or closed.
    pub detached: usize,
}

/// Registry of live push-feed subscribers.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct BroadcastHub {
    registry: Arc<Registry>,
    buffer: usize,
}

impl BroadcastHub {
    /// Create a hub whose subscribers each buffer up to `buffer` events.
    ///
    /// A `buffer` of zero is treated as one.
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            buffer: buffer.max(1),
        }
    }

    /// Attach a new subscriber. It receives every event published after
    /// this call returns, until it is detached or dropped.
    pub fn attach(&self) -> Subscription {
        let id = SubscriberId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);
        let live = Arc::new(AtomicBool::new(true));
        self.registry.slots().insert(
            id,
            Slot {
                tx,
                live: Arc::clone(&live),
            },
        );
        debug!(subscriber = %id, "Subscriber attached");
        Subscription {
            id,
            rx,
            live,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Detach a subscriber. Returns `true` if it was attached.
    ///
    /// Detaching an id that is already gone is a no-op.
    pub fn detach(&self, id: SubscriberId) -> bool {
        let removed = self.registry.remove(id);
        if removed {
            debug!(subscriber = %id, "Subscriber detached");
        }
        removed
    }

    /// Queue `event` for every attached subscriber whose transport is live.
    ///
    /// Never waits on a subscriber. Subscribers whose queue is full
    /// (stalled) or closed (gone) are detached and counted in
    /// [`PublishReport::detached`].
    pub fn publish(&self, event: &Event) -> PublishReport {
        let targets: Vec<(SubscriberId, Slot)> = self
            .registry
            .slots()
            .iter()
            .map(|(id, slot)| (*id, slot.clone()))
            .collect();

        let shared = Arc::new(event.clone());
        let mut report = PublishReport::default();

        for (id, slot) in targets {
            if !slot.live.load(Ordering::Acquire) {
                continue;
            }
            match slot.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = %id, event_id = %event.id, "Subscriber stalled, detaching");
                    if self.registry.remove(id) {
                        report.detached = report.detached.saturating_add(1);
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber = %id, "Subscriber transport closed, detaching");
                    if self.registry.remove(id) {
                        report.detached = report.detached.saturating_add(1);
                    }
                }
            }
        }

        report
    }

    /// Detach every subscriber. Returns how many were attached.
    ///
    /// Their pending [`Subscription::recv`] calls resolve to `None`.
    pub fn detach_all(&self) -> usize {
        let drained: Vec<Slot> = self.registry.slots().drain().map(|(_, slot)| slot).collect();
        for slot in &drained {
            slot.live.store(false, Ordering::Release);
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "All subscribers detached");
        }
        drained.len()
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.slots().len()
    }

    /// Per-subscriber queue depth.
    pub const fn buffer(&self) -> usize {
        self.buffer
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(64)
    }
}

impl core::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("subscribers", &self.subscriber_count())
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl EventSink for BroadcastHub {
    fn on_event(&self, event: &Event) -> usize {
        let report = self.publish(event);
        if report.delivered > 0 || report.detached > 0 {
            debug!(
                event_id = %event.id,
                delivered = report.delivered,
                detached = report.detached,
                "Event broadcast"
            );
        }
        report.delivered
    }
}

/// The receiving end of one attached subscriber.
///
/// Dropping a `Subscription` detaches it.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<Event>>,
    live: Arc<AtomicBool>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// This subscriber's id.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the hub still considers this subscriber attached.
    pub fn is_attached(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscriber has been detached (explicitly,
    /// for stalling, or because the hub is gone).
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        if !self.is_attached() {
            return None;
        }
        let event = self.rx.recv().await?;
        self.is_attached().then_some(event)
    }

    /// Detach now. Equivalent to dropping the subscription.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                debug!(subscriber = %self.id, "Subscriber dropped");
            }
        }
        self.live.store(false, Ordering::Release);
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}
