//! `WebSocket` push feed.
//!
//! Each connection attaches one subscription to the
//! [`BroadcastHub`](kickstream_core::hub::BroadcastHub) and forwards every
//! event it receives as a single JSON text frame. Text sent by the client
//! is logged and otherwise ignored.
//!
//! Every write is bounded by [`SEND_TIMEOUT`]. A peer that keeps the
//! connection open but stops reading is dropped once a write times out.
//!
//! The subscription is owned by the connection task, so it is detached
//! whichever way the task ends: client close, transport error, failed or
//! timed-out send, or the hub dropping a stalled subscriber.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::{Sink, SinkExt, Stream, StreamExt};
use kickstream_core::hub::Subscription;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upper bound on a single frame write to a push-feed client.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Complete the upgrade handshake and start streaming events.
pub fn upgrade_feed(upgrade: WebSocketUpgrade, state: Arc<AppState>) -> Response {
    upgrade
        .on_upgrade(move |socket| async move {
            let subscription = state.hub.attach();
            let (sink, inbound) = socket.split();
            stream_events(sink, inbound, subscription, SEND_TIMEOUT).await;
        })
        .into_response()
}

/// Pump events from `subscription` into `sink` until either side ends.
pub(crate) async fn stream_events<Tx, Rx, E>(
    mut sink: Tx,
    mut inbound: Rx,
    mut subscription: Subscription,
    send_timeout: Duration,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let subscriber = subscription.id();
    info!(%subscriber, "Push feed client connected");

    loop {
        tokio::select! {
            next = subscription.recv() => {
                let Some(event) = next else {
                    debug!(%subscriber, "Subscriber detached by hub, closing socket");
                    let _ = send_frame(&mut sink, Message::Close(None), send_timeout).await;
                    break;
                };
                let json = match serde_json::to_string(event.as_ref()) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!(%subscriber, error = %e, "Failed to serialize event");
                        continue;
                    }
                };
                if let Err(reason) = send_frame(&mut sink, Message::Text(json.into()), send_timeout).await {
                    debug!(%subscriber, reason, "Push feed client dropped");
                    break;
                }
            }
            msg = inbound.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        info!(%subscriber, message = %text.as_str(), "Received client message");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(reason) = send_frame(&mut sink, Message::Pong(data), send_timeout).await {
                            debug!(%subscriber, reason, "Push feed client dropped while answering ping");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%subscriber, "Push feed client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(%subscriber, error = %e, "Push feed transport error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    subscription.detach();
    info!(%subscriber, "Push feed client detached");
}

/// Write one frame, giving up after `limit`.
async fn send_frame<Tx>(sink: &mut Tx, frame: Message, limit: Duration) -> Result<(), &'static str>
where
    Tx: Sink<Message> + Unpin,
{
    match tokio::time::timeout(limit, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err("send failed"),
        Err(_elapsed) => Err("send timed out"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::io;

    use futures::channel::mpsc;
    use futures::stream;
    use kickstream_core::hub::BroadcastHub;
    use kickstream_types::{BallId, Event, EventId, EventType, PlayerId};

    use super::*;

    fn event(n: u8) -> Event {
        Event {
            id: EventId::generate(),
            ball_id: BallId::new("ball-b"),
            player_id: PlayerId::new("player-2"),
            event_type: EventType::Pass,
            speed: f64::from(n),
            max_height: 4.0,
            spin: 1200.0,
        }
    }

    fn silent_client() -> stream::Pending<Result<Message, io::Error>> {
        stream::pending()
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_events_as_text_then_closes_on_detach() {
        let hub = BroadcastHub::new(8);
        let subscription = hub.attach();
        let (tx, mut frames) = mpsc::channel::<Message>(16);
        let first = event(1);
        let second = event(2);
        hub.publish(&first);
        hub.publish(&second);

        let pump = tokio::spawn(stream_events(
            tx,
            silent_client(),
            subscription,
            Duration::from_secs(1),
        ));

        for expected in [&first, &second] {
            let Some(Message::Text(text)) = frames.next().await else {
                panic!("expected a text frame");
            };
            let got: Event = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(&got, expected);
        }

        assert_eq!(hub.detach_all(), 1);
        assert!(matches!(frames.next().await, Some(Message::Close(None))));
        pump.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn peer_that_stops_reading_is_released_after_send_timeout() {
        let hub = BroadcastHub::new(8);
        let subscription = hub.attach();
        // Room for one frame; nobody ever reads it.
        let (tx, _unread) = mpsc::channel::<Message>(0);

        let pump = tokio::spawn(stream_events(
            tx,
            silent_client(),
            subscription,
            Duration::from_secs(1),
        ));
        for n in 0..3 {
            hub.publish(&event(n));
        }

        tokio::time::timeout(Duration::from_secs(30), pump)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hub.subscriber_count(), 0);
    }
}
