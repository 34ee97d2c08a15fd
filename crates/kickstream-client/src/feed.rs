//! `WebSocket` push-feed connector.

use futures::StreamExt;
use futures::future::BoxFuture;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::driver::{FeedConnector, FeedStream};
use crate::error::ClientError;

/// Connects to the server's `/events` `WebSocket`.
///
/// Only text frames reach the reconciler. Pings are answered by
/// tungstenite while reading; a close frame ends the stream.
#[derive(Debug, Clone)]
pub struct WsFeedConnector {
    url: String,
    connect_timeout: Duration,
}

impl WsFeedConnector {
    /// Connector for `config.ws_url`, bounded by `config.request_timeout`.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_url(&config.ws_url, config.request_timeout)
    }

    /// Connector for an explicit URL.
    pub fn with_url(url: &str, connect_timeout: Duration) -> Self {
        Self {
            url: url.to_owned(),
            connect_timeout,
        }
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedConnector for WsFeedConnector {
    fn connect(&self) -> BoxFuture<'static, Result<FeedStream, ClientError>> {
        let url = self.url.clone();
        let timeout = self.connect_timeout;

        Box::pin(async move {
            let (socket, _response) = tokio::time::timeout(timeout, connect_async(url.as_str()))
                .await
                .map_err(|_elapsed| ClientError::Timeout {
                    url: url.clone(),
                    timeout_ms: timeout.as_millis(),
                })??;
            info!(%url, "Feed connected");

            let frames = socket.filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(other) => {
                        debug!(kind = frame_kind(&other), "Ignoring non-text frame");
                        None
                    }
                    Err(e) => Some(Err(ClientError::from(e))),
                }
            });
            Ok(frames.boxed())
        })
    }
}

const fn frame_kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "frame",
    }
}
