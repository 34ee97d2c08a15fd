//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup so `main` can
//! propagate with `?`. Nothing after startup is fatal except the API
//! server task itself dying.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: kickstream_core::config::ConfigError,
    },

    /// The event source could not be constructed.
    #[error("event source error: {source}")]
    Source {
        /// The underlying source error.
        #[from]
        source: kickstream_core::source::SourceError,
    },

    /// The API server failed to start.
    #[error("server startup error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: kickstream_server::startup::StartupError,
    },

    /// The API server task ended while the engine was still running.
    #[error("API server stopped unexpectedly: {message}")]
    ServerExited {
        /// Description of how the task ended.
        message: String,
    },
}
