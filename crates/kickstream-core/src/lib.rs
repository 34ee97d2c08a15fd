//! Event log, broadcast hub, and ticker for the kickstream event feed.
//!
//! This crate owns the server-side core of the feed: an append-only
//! in-memory log, a fan-out registry of push subscribers, and the periodic
//! ticker that is the log's only writer.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `kickstream-config.yaml` into
//!   strongly-typed structs.
//! - [`hub`] -- [`BroadcastHub`] with explicit attach/detach and
//!   non-blocking publish.
//! - [`log`] -- [`EventLog`], the append-only source of truth.
//! - [`source`] -- [`EventSource`] trait and [`RandomEventSource`].
//! - [`ticker`] -- [`Ticker`] loop, [`EventSink`] trait, and startup
//!   seeding.
//!
//! [`BroadcastHub`]: hub::BroadcastHub
//! [`EventLog`]: log::EventLog
//! [`EventSource`]: source::EventSource
//! [`RandomEventSource`]: source::RandomEventSource
//! [`Ticker`]: ticker::Ticker
//! [`EventSink`]: ticker::EventSink

pub mod config;
pub mod hub;
pub mod log;
pub mod source;
pub mod ticker;
