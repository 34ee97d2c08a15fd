//! HTTP access to the snapshot and reference-data endpoints.

use futures::future::BoxFuture;
use kickstream_types::{Event, HealthReport, Player};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::driver::SnapshotSource;
use crate::error::ClientError;

/// Reads `/events`, `/players` and `/health` from a kickstream server.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSnapshotSource {
    /// Build a source for `config`, with its request timeout applied.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Build a source on an existing client.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// `GET /events`: the full log in append order.
    pub async fn fetch_events(&self) -> Result<Vec<Event>, ClientError> {
        self.get_json("/events").await
    }

    /// `GET /players`: the static player table.
    pub async fn fetch_players(&self) -> Result<Vec<Player>, ClientError> {
        self.get_json("/players").await
    }

    /// `GET /health`.
    pub async fn fetch_health(&self) -> Result<HealthReport, ClientError> {
        self.get_json("/health").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch_snapshot(&self) -> BoxFuture<'static, Result<Vec<Event>, ClientError>> {
        let this = self.clone();
        Box::pin(async move { this.fetch_events().await })
    }
}
