//! Async driver for the [`StreamReconciler`].
//!
//! [`spawn_reconciler`] moves a reconciler onto its own task together with
//! a [`SnapshotSource`] and a [`FeedConnector`]. The task multiplexes the
//! snapshot fetch, the feed attach, feed frames, the reconnect timer and
//! control requests with `tokio::select!`, so every completion reaches the
//! state machine one at a time.
//!
//! The returned [`ReconcilerHandle`] is the application's side of the
//! task. Dropping every clone of it tears the reconciler down.

use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use kickstream_types::Event;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Sleep;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::reconciler::{Command, Phase, ReconcilerStatus, StreamReconciler, Ticket};

/// Stream of text frames from an attached feed. The stream ending means
/// the feed was closed.
pub type FeedStream = BoxStream<'static, Result<String, ClientError>>;

/// Fetches the full event log.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Start one fetch. The future must not borrow `self`.
    fn fetch_snapshot(&self) -> BoxFuture<'static, Result<Vec<Event>, ClientError>>;
}

/// Opens push-feed connections.
pub trait FeedConnector: Send + Sync + 'static {
    /// Start one connection attempt. The future must not borrow `self`.
    fn connect(&self) -> BoxFuture<'static, Result<FeedStream, ClientError>>;
}

/// Requests from a handle to the driver task.
#[derive(Debug)]
enum Control {
    Retry,
    Stop,
    Abandon(String),
    EventsSince(usize, oneshot::Sender<Vec<Event>>),
}

/// Application-side handle to a running reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerHandle {
    control: mpsc::UnboundedSender<Control>,
    status: watch::Receiver<ReconcilerStatus>,
}

impl ReconcilerHandle {
    /// Ask for a new snapshot fetch after a failure. Ignored unless the
    /// reconciler is idle.
    pub fn retry(&self) -> Result<(), ClientError> {
        self.send(Control::Retry)
    }

    /// Tear the reconciler down. The local view stays readable.
    pub fn stop(&self) -> Result<(), ClientError> {
        self.send(Control::Stop)
    }

    /// Give up on the stream and enter the terminal failed phase.
    pub fn abandon(&self, reason: impl Into<String>) -> Result<(), ClientError> {
        self.send(Control::Abandon(reason.into()))
    }

    /// Copy of the whole local view.
    pub async fn view(&self) -> Result<Vec<Event>, ClientError> {
        self.events_since(0).await
    }

    /// Copy of the local view from index `start` on. Empty if `start` is
    /// past the end.
    pub async fn events_since(&self, start: usize) -> Result<Vec<Event>, ClientError> {
        let (reply, response) = oneshot::channel();
        self.send(Control::EventsSince(start, reply))?;
        response.await.map_err(|_closed| ClientError::Closed)
    }

    /// Receiver that observes every status change.
    pub fn status(&self) -> watch::Receiver<ReconcilerStatus> {
        self.status.clone()
    }

    /// The latest status.
    pub fn current_status(&self) -> ReconcilerStatus {
        self.status.borrow().clone()
    }

    fn send(&self, control: Control) -> Result<(), ClientError> {
        self.control.send(control).map_err(|_closed| ClientError::Closed)
    }
}

/// Start a reconciler on a new task and begin loading immediately.
pub fn spawn_reconciler<S, C>(source: S, connector: C, reconnect_delay: Duration) -> ReconcilerHandle
where
    S: SnapshotSource,
    C: FeedConnector,
{
    let machine = StreamReconciler::new(reconnect_delay);
    let (status_tx, status_rx) = watch::channel(machine.status());
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    let driver = Driver {
        machine,
        source,
        connector,
        snapshot: None,
        attach: None,
        feed: None,
        reconnect: None,
        status: status_tx,
    };
    tokio::spawn(driver.run(control_rx));

    ReconcilerHandle {
        control: control_tx,
        status: status_rx,
    }
}

type Pending<T> = Option<(Ticket, BoxFuture<'static, T>)>;

/// One completed wait inside the driver loop.
enum Step {
    Control(Option<Control>),
    Snapshot(Ticket, Result<Vec<Event>, ClientError>),
    Attach(Ticket, Result<FeedStream, ClientError>),
    Frame(Ticket, Option<Result<String, ClientError>>),
    ReconnectDue(Ticket),
}

struct Driver<S, C> {
    machine: StreamReconciler,
    source: S,
    connector: C,
    snapshot: Pending<Result<Vec<Event>, ClientError>>,
    attach: Pending<Result<FeedStream, ClientError>>,
    feed: Option<(Ticket, FeedStream)>,
    reconnect: Option<(Ticket, Pin<Box<Sleep>>)>,
    status: watch::Sender<ReconcilerStatus>,
}

impl<S: SnapshotSource, C: FeedConnector> Driver<S, C> {
    async fn run(mut self, mut controls: mpsc::UnboundedReceiver<Control>) {
        let commands = self.machine.start();
        self.execute(commands);
        self.publish_status();

        loop {
            let step = tokio::select! {
                control = controls.recv() => Step::Control(control),
                (ticket, result) = settle(&mut self.snapshot) => Step::Snapshot(ticket, result),
                (ticket, result) = settle(&mut self.attach) => Step::Attach(ticket, result),
                (ticket, frame) = next_frame(&mut self.feed) => Step::Frame(ticket, frame),
                ticket = fire(&mut self.reconnect) => Step::ReconnectDue(ticket),
            };

            if !self.apply(step) {
                break;
            }
            self.publish_status();
        }

        let commands = self.machine.stop();
        self.execute(commands);
        self.cancel_in_flight();
        self.publish_status();
        debug!("Reconciler task exiting");
    }

    /// Feed one step to the state machine. Returns `false` once every
    /// handle is gone.
    fn apply(&mut self, step: Step) -> bool {
        let commands = match step {
            Step::Control(None) => return false,
            Step::Control(Some(Control::Retry)) => self.machine.retry(),
            Step::Control(Some(Control::Stop)) => {
                let commands = self.machine.stop();
                self.cancel_in_flight();
                commands
            }
            Step::Control(Some(Control::Abandon(reason))) => {
                let commands = self.machine.abandon(reason);
                if self.machine.phase().is_terminal() {
                    self.cancel_in_flight();
                }
                commands
            }
            Step::Control(Some(Control::EventsSince(start, reply))) => {
                let tail = self
                    .machine
                    .view()
                    .get(start..)
                    .map(<[Event]>::to_vec)
                    .unwrap_or_default();
                let _ = reply.send(tail);
                Vec::new()
            }
            Step::Snapshot(ticket, Ok(events)) => self.machine.snapshot_loaded(ticket, events),
            Step::Snapshot(ticket, Err(e)) => self.machine.snapshot_failed(ticket, e.to_string()),
            Step::Attach(ticket, Ok(stream)) => {
                let commands = self.machine.feed_attached(ticket, Utc::now());
                if self.machine.phase() == Phase::Live && self.machine.is_current(ticket) {
                    self.feed = Some((ticket, stream));
                } else {
                    debug!(%ticket, "Dropping feed opened for a stale attempt");
                }
                commands
            }
            Step::Attach(ticket, Err(e)) => self.machine.feed_attach_failed(ticket, e.to_string()),
            Step::Frame(ticket, Some(Ok(text))) => {
                self.machine.feed_message(ticket, &text);
                Vec::new()
            }
            Step::Frame(ticket, Some(Err(e))) => {
                self.feed = None;
                self.machine.feed_lost(ticket, Some(e.to_string()))
            }
            Step::Frame(ticket, None) => {
                self.feed = None;
                self.machine.feed_lost(ticket, None)
            }
            Step::ReconnectDue(ticket) => self.machine.reconnect_due(ticket),
        };
        self.execute(commands);
        true
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::FetchSnapshot(ticket) => {
                    debug!(%ticket, "Fetching snapshot");
                    self.snapshot = Some((ticket, self.source.fetch_snapshot()));
                }
                Command::AttachFeed(ticket) => {
                    debug!(%ticket, "Attaching feed");
                    self.attach = Some((ticket, self.connector.connect()));
                }
                Command::ScheduleReconnect(ticket, delay) => {
                    self.reconnect = Some((ticket, Box::pin(tokio::time::sleep(delay))));
                }
                Command::CancelReconnect => self.reconnect = None,
                Command::CloseFeed => {
                    if self.feed.take().is_some() {
                        info!("Live feed closed");
                    }
                    self.attach = None;
                }
            }
        }
    }

    fn cancel_in_flight(&mut self) {
        self.snapshot = None;
        self.attach = None;
        self.feed = None;
        self.reconnect = None;
    }

    fn publish_status(&self) {
        let next = self.machine.status();
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Await the pending operation, or never resolve if there is none.
async fn settle<T>(slot: &mut Pending<T>) -> (Ticket, T) {
    let Some((ticket, operation)) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let output = operation.await;
    let ticket = *ticket;
    *slot = None;
    (ticket, output)
}

async fn next_frame(
    feed: &mut Option<(Ticket, FeedStream)>,
) -> (Ticket, Option<Result<String, ClientError>>) {
    let Some((ticket, stream)) = feed.as_mut() else {
        return std::future::pending().await;
    };
    (*ticket, stream.next().await)
}

async fn fire(timer: &mut Option<(Ticket, Pin<Box<Sleep>>)>) -> Ticket {
    let Some((ticket, sleep)) = timer.as_mut() else {
        return std::future::pending().await;
    };
    sleep.as_mut().await;
    let ticket = *ticket;
    *timer = None;
    ticket
}
