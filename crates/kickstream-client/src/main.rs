//! `kickstream-watch`: follow a kickstream server from the terminal.
//!
//! Loads the player table, starts a reconciler, and prints every event
//! added to the local view with the player's name. When the snapshot
//! fetch fails the error is shown and pressing Enter retries. Ctrl-C
//! stops the reconciler and exits.

use kickstream_client::{
    ClientConfig, HttpSnapshotSource, Phase, ReconcilerHandle, ReconcilerStatus,
    WsFeedConnector, spawn_reconciler,
};
use std::future::Future;

use kickstream_types::{Event, PlayerDirectory};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    info!(
        base_url = config.base_url,
        ws_url = config.ws_url,
        reconnect_delay_ms = config.reconnect_delay.as_millis(),
        "kickstream-watch starting"
    );

    let http = HttpSnapshotSource::new(&config)?;
    let players = match http.fetch_players().await {
        Ok(players) => PlayerDirectory::new(players),
        Err(e) => {
            warn!(error = %e, "Player table unavailable, showing raw ids");
            PlayerDirectory::default()
        }
    };

    let handle = spawn_reconciler(http, WsFeedConnector::new(&config), config.reconnect_delay);
    watch(
        &handle,
        &players,
        BufReader::new(tokio::io::stdin()),
        interrupted(),
    )
    .await?;

    handle.stop()?;
    info!("kickstream-watch stopped");
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Print view growth and phase changes until `shutdown` resolves.
///
/// Each line read from `input` asks for a snapshot retry.
async fn watch(
    handle: &ReconcilerHandle,
    players: &PlayerDirectory,
    input: impl AsyncBufRead + Unpin,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let mut status = handle.status();
    let mut stdin = input.lines();
    let mut stdin_open = true;
    let mut shutdown = std::pin::pin!(shutdown);
    let mut printed: usize = 0;
    let mut last_phase = Phase::Idle;

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = status.borrow_and_update().clone();
                report_phase(last_phase, &current);
                last_phase = current.phase;

                // A retried snapshot replaces the view wholesale.
                if current.events < printed {
                    printed = 0;
                }
                if current.events > printed {
                    for event in handle.events_since(printed).await? {
                        println!("{}", describe(&event, players));
                        printed = printed.saturating_add(1);
                    }
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => handle.retry()?,
                    Ok(None) | Err(_) => stdin_open = false,
                }
            }
            () = &mut shutdown => return Ok(()),
        }
    }
}

fn report_phase(previous: Phase, status: &ReconcilerStatus) {
    if previous == status.phase {
        return;
    }
    match (status.phase, status.last_error.as_deref()) {
        (Phase::Idle, Some(error)) => {
            eprintln!("snapshot failed: {error} (press Enter to retry)");
        }
        (Phase::Reconnecting, error) => {
            eprintln!("feed lost ({}), reconnecting", error.unwrap_or("closed"));
        }
        (Phase::Live, _) => eprintln!("live ({} events)", status.events),
        _ => {}
    }
}

fn describe(event: &Event, players: &PlayerDirectory) -> String {
    let who = players
        .get(&event.player_id)
        .map_or_else(|| event.player_id.to_string(), kickstream_types::Player::full_name);
    format!(
        "{} {:<5} {:<24} {}  speed {:>6.2}  height {:>5.2}  spin {:>7.2}",
        event.id,
        event.event_type.as_str(),
        who,
        event.ball_id,
        event.speed,
        event.max_height,
        event.spin
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use futures::future::BoxFuture;
    use kickstream_client::{ClientError, FeedConnector, FeedStream, SnapshotSource};
    use tokio::sync::oneshot;

    use super::*;

    /// Serves an empty snapshot, then never finishes attaching.
    struct EmptyServer;

    impl SnapshotSource for EmptyServer {
        fn fetch_snapshot(&self) -> BoxFuture<'static, Result<Vec<Event>, ClientError>> {
            Box::pin(futures::future::ready(Ok(Vec::new())))
        }
    }

    impl FeedConnector for EmptyServer {
        fn connect(&self) -> BoxFuture<'static, Result<FeedStream, ClientError>> {
            Box::pin(futures::future::pending())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_watch_while_input_stays_open() {
        let handle = spawn_reconciler(EmptyServer, EmptyServer, Duration::from_secs(5));
        let players = PlayerDirectory::builtin();
        let (_keyboard, terminal) = tokio::io::duplex(64);
        let (interrupt, interrupted) = oneshot::channel::<()>();

        let watcher = watch(&handle, &players, BufReader::new(terminal), async move {
            let _ = interrupted.await;
        });
        interrupt.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(30), watcher)
            .await
            .unwrap()
            .unwrap();
        handle.stop().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn watch_keeps_running_until_shutdown() {
        let handle = spawn_reconciler(EmptyServer, EmptyServer, Duration::from_secs(5));
        let players = PlayerDirectory::builtin();
        let (_keyboard, terminal) = tokio::io::duplex(64);

        let watcher = watch(
            &handle,
            &players,
            BufReader::new(terminal),
            std::future::pending::<()>(),
        );
        assert!(tokio::time::timeout(Duration::from_secs(30), watcher).await.is_err());
    }
}
