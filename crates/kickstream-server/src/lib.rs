//! Snapshot + push API server for the kickstream event feed.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Snapshot endpoint** (`GET /events`) returning the full event log
//! - **`WebSocket` push feed** (upgrade on the same `/events` path) that
//!   streams each newly logged event as a JSON text frame
//! - **Reference data** (`GET /players`)
//! - **Liveness probe** (`GET /health`)
//!
//! # Architecture
//!
//! The server only reads the [`EventLog`] and attaches subscribers to the
//! [`BroadcastHub`]; the ticker owned by the engine binary is the sole
//! writer. Each `WebSocket` connection holds one hub subscription for its
//! whole lifetime and detaches it when the connection ends, however it
//! ends.
//!
//! [`EventLog`]: kickstream_core::log::EventLog
//! [`BroadcastHub`]: kickstream_core::hub::BroadcastHub

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_server;
pub use state::AppState;
