//! Client side of the kickstream feed.
//!
//! A client loads the server's event log once, attaches to the push feed
//! for everything after it, and keeps re-attaching on a fixed delay when
//! the feed drops. The pieces:
//!
//! - [`reconciler`] -- the pure state machine owning the local view
//! - [`driver`] -- the task that performs its I/O, plus the
//!   [`SnapshotSource`] and [`FeedConnector`] seams
//! - [`http`] / [`feed`] -- reqwest and tokio-tungstenite implementations
//! - [`config`] -- environment configuration

pub mod config;
pub mod driver;
pub mod error;
pub mod feed;
pub mod http;
pub mod reconciler;

pub use config::ClientConfig;
pub use driver::{FeedConnector, FeedStream, ReconcilerHandle, SnapshotSource, spawn_reconciler};
pub use error::ClientError;
pub use feed::WsFeedConnector;
pub use http::HttpSnapshotSource;
pub use reconciler::{Command, Phase, ReconcilerStatus, StreamReconciler, Ticket};
