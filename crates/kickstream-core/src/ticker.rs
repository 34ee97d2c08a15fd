//! The periodic producer that drives the feed.
//!
//! Each tick pulls one event from the [`EventSource`], appends it to the
//! [`EventLog`], and hands exactly that event to the [`EventSink`] (the
//! broadcast hub in production). The ticker is the only writer of the log.
//!
//! A failed generation skips the tick; the next tick proceeds normally.
//! The loop has no stop condition of its own and ends when its future is
//! dropped at shutdown.

use std::sync::Arc;
use std::time::Duration;

use kickstream_types::{Event, EventId};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::log::EventLog;
use crate::source::EventSource;

/// Receiver of each newly logged event.
///
/// Implementations must not block; they run inline in the tick cycle.
pub trait EventSink: Send + Sync {
    /// Called once per logged event. Returns how many consumers it reached.
    fn on_event(&self, event: &Event) -> usize;
}

/// A sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn on_event(&self, _event: &Event) -> usize {
        0
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// An event was logged and handed to the sink.
    Published {
        /// The logged event.
        event_id: EventId,
        /// Log length after the append.
        log_len: usize,
        /// Consumers the sink reached.
        delivered: usize,
    },
    /// Generation failed; nothing was logged.
    Skipped,
}

/// Periodic event producer.
pub struct Ticker<S> {
    source: S,
    log: Arc<EventLog>,
    sink: Arc<dyn EventSink>,
    period: Duration,
}

impl<S: EventSource> Ticker<S> {
    /// Create a ticker that fires every `period`.
    ///
    /// A zero `period` is raised to one millisecond.
    pub fn new(source: S, log: Arc<EventLog>, sink: Arc<dyn EventSink>, period: Duration) -> Self {
        Self {
            source,
            log,
            sink,
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// The configured period.
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Run one generate → append → publish cycle.
    pub async fn tick(&mut self) -> TickOutcome {
        let event = match self.source.next_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Event generation failed, skipping tick");
                return TickOutcome::Skipped;
            }
        };

        let event_id = event.id.clone();
        debug!(
            event_id = %event_id,
            event_type = %event.event_type,
            player_id = %event.player_id,
            "Generated event"
        );

        let log_len = self.log.append(event.clone()).await;
        let delivered = self.sink.on_event(&event);

        TickOutcome::Published {
            event_id,
            log_len,
            delivered,
        }
    }

    /// Tick forever at the configured period.
    ///
    /// The first tick fires one full period after the call.
    pub async fn run(mut self) {
        let start = Instant::now()
            .checked_add(self.period)
            .unwrap_or_else(Instant::now);
        let mut interval = tokio::time::interval_at(start, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_ms = self.period.as_millis(), "Ticker started");

        loop {
            interval.tick().await;
            if let TickOutcome::Published {
                event_id,
                log_len,
                delivered,
            } = self.tick().await
            {
                info!(%event_id, log_len, delivered, "Tick published");
            }
        }
    }
}

impl<S> core::fmt::Debug for Ticker<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ticker")
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

/// Fill `log` with `count` generated events without publishing them.
///
/// Used at startup so the first snapshot already has history. Failed
/// generations are skipped, so fewer than `count` events may be added.
/// Returns the number appended.
pub async fn seed_log(source: &mut dyn EventSource, log: &EventLog, count: usize) -> usize {
    let mut appended: usize = 0;
    for _ in 0..count {
        match source.next_event() {
            Ok(event) => {
                log.append(event).await;
                appended = appended.saturating_add(1);
            }
            Err(e) => warn!(error = %e, "Seed event generation failed, skipping"),
        }
    }
    appended
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use kickstream_types::PlayerDirectory;

    use super::*;
    use crate::hub::BroadcastHub;
    use crate::source::{RandomEventSource, SourceError};

    /// Fails on every call whose index is in `fail_on`.
    struct FlakySource {
        inner: RandomEventSource,
        calls: usize,
        fail_on: Vec<usize>,
    }

    impl FlakySource {
        fn new(fail_on: Vec<usize>) -> Self {
            Self {
                inner: RandomEventSource::with_seed(&PlayerDirectory::builtin(), 1).unwrap(),
                calls: 0,
                fail_on,
            }
        }
    }

    impl EventSource for FlakySource {
        fn next_event(&mut self) -> Result<Event, SourceError> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_on.contains(&call) {
                return Err(SourceError::Generation {
                    message: format!("induced failure {call}"),
                });
            }
            self.inner.next_event()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<EventId>>,
    }

    impl EventSink for RecordingSink {
        fn on_event(&self, event: &Event) -> usize {
            self.seen.lock().unwrap().push(event.id.clone());
            1
        }
    }

    #[tokio::test]
    async fn tick_appends_then_publishes_the_same_event() {
        let log = Arc::new(EventLog::new());
        let sink = Arc::new(RecordingSink::default());
        let mut ticker = Ticker::new(
            FlakySource::new(vec![]),
            Arc::clone(&log),
            sink.clone(),
            Duration::from_secs(10),
        );

        let (event_id, log_len, delivered) = match ticker.tick().await {
            TickOutcome::Published {
                event_id,
                log_len,
                delivered,
            } => (event_id, log_len, delivered),
            other => panic!("expected a published tick, got {other:?}"),
        };
        assert_eq!(log_len, 1);
        assert_eq!(delivered, 1);
        assert_eq!(log.snapshot().await.first().unwrap().id, event_id);
        assert_eq!(*sink.seen.lock().unwrap(), vec![event_id]);
    }

    #[tokio::test]
    async fn generation_failure_skips_only_that_tick() {
        let log = Arc::new(EventLog::new());
        let sink = Arc::new(RecordingSink::default());
        let mut ticker = Ticker::new(
            FlakySource::new(vec![1]),
            Arc::clone(&log),
            sink.clone(),
            Duration::from_secs(10),
        );

        assert!(matches!(ticker.tick().await, TickOutcome::Published { .. }));
        assert_eq!(ticker.tick().await, TickOutcome::Skipped);
        assert!(matches!(ticker.tick().await, TickOutcome::Published { .. }));

        assert_eq!(log.len().await, 2);
        assert_eq!(sink.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_fires_once_per_period() {
        let log = Arc::new(EventLog::new());
        let ticker = Ticker::new(
            FlakySource::new(vec![]),
            Arc::clone(&log),
            Arc::new(NoOpSink),
            Duration::from_secs(10),
        );
        let handle = tokio::spawn(ticker.run());

        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert_eq!(log.len().await, 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(log.len().await, 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(log.len().await, 4);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn run_keeps_going_after_failures() {
        let log = Arc::new(EventLog::new());
        let ticker = Ticker::new(
            FlakySource::new(vec![0, 2]),
            Arc::clone(&log),
            Arc::new(NoOpSink),
            Duration::from_millis(100),
        );
        let handle = tokio::spawn(ticker.run());

        tokio::time::sleep(Duration::from_millis(550)).await;
        assert_eq!(log.len().await, 3);
        handle.abort();
    }

    #[tokio::test]
    async fn hub_sink_delivers_in_log_order() {
        let log = Arc::new(EventLog::new());
        let hub = BroadcastHub::new(16);
        let mut sub = hub.attach();
        let mut ticker = Ticker::new(
            FlakySource::new(vec![]),
            Arc::clone(&log),
            Arc::new(hub.clone()),
            Duration::from_secs(1),
        );

        for _ in 0..5 {
            ticker.tick().await;
        }

        for logged in log.snapshot().await {
            assert_eq!(sub.recv().await.unwrap().id, logged.id);
        }
    }

    #[tokio::test]
    async fn seed_log_skips_failures() {
        let log = EventLog::new();
        let mut source = FlakySource::new(vec![0, 5]);
        let appended = seed_log(&mut source, &log, 10).await;
        assert_eq!(appended, 8);
        assert_eq!(log.len().await, 8);
    }
}
