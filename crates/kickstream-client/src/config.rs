//! Client configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `KICKSTREAM_URL` | `http://localhost:8888` |
//! | `KICKSTREAM_WS_URL` | derived from `KICKSTREAM_URL`: `ws://…/events` |
//! | `KICKSTREAM_RECONNECT_DELAY_MS` | `5000` |
//! | `KICKSTREAM_REQUEST_TIMEOUT_MS` | `10000` |

use std::time::Duration;

use crate::error::ClientError;

/// Default server base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";

/// Default fixed delay between a feed loss and the next attach attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;

/// Default bound on a single snapshot request or feed handshake.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Where and how the client connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// HTTP base URL of the server, without trailing slash.
    pub base_url: String,
    /// `WebSocket` URL of the push feed.
    pub ws_url: String,
    /// Fixed delay before re-attaching a lost feed.
    pub reconnect_delay: Duration,
    /// Timeout for one snapshot request or feed handshake.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            ws_url: String::from("ws://localhost:8888/events"),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Build a configuration pointing at `base_url`, deriving the feed URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `base_url` is not `http(s)://`.
    pub fn for_base_url(base_url: &str) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let ws_url = derive_ws_url(&base_url)?;
        Ok(Self {
            base_url,
            ws_url,
            ..Self::default()
        })
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a variable is malformed.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base = lookup("KICKSTREAM_URL").unwrap_or_else(|| String::from(DEFAULT_BASE_URL));
        let mut config = Self::for_base_url(&base)?;

        if let Some(ws_url) = lookup("KICKSTREAM_WS_URL") {
            config.ws_url = ws_url;
        }
        if let Some(raw) = lookup("KICKSTREAM_RECONNECT_DELAY_MS") {
            config.reconnect_delay = parse_millis("KICKSTREAM_RECONNECT_DELAY_MS", &raw)?;
        }
        if let Some(raw) = lookup("KICKSTREAM_REQUEST_TIMEOUT_MS") {
            config.request_timeout = parse_millis("KICKSTREAM_REQUEST_TIMEOUT_MS", &raw)?;
        }

        Ok(config)
    }

    /// URL of the snapshot endpoint.
    pub fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    /// URL of the player table endpoint.
    pub fn players_url(&self) -> String {
        format!("{}/players", self.base_url)
    }
}

fn derive_ws_url(base_url: &str) -> Result<String, ClientError> {
    if let Some(rest) = base_url.strip_prefix("https://") {
        Ok(format!("wss://{rest}/events"))
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        Ok(format!("ws://{rest}/events"))
    } else {
        Err(ClientError::Config {
            message: format!("base URL must start with http:// or https://, got {base_url}"),
        })
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration, ClientError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ClientError::Config {
            message: format!("{key} must be a whole number of milliseconds: {e}"),
        })
}
