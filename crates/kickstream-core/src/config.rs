//! Configuration loading and typed config structures for the kickstream
//! server.
//!
//! The configuration lives in `kickstream-config.yaml` in the working
//! directory. Every field has a default matching the reference deployment,
//! so an absent file or a partial file is fine. A handful of environment
//! variables override the file for container deployments.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default file name looked up by the engine binary.
pub const DEFAULT_CONFIG_FILE: &str = "kickstream-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `kickstream-config.yaml`:
///
/// ```yaml
/// http:
///   host: "0.0.0.0"
///   port: 8888
/// feed:
///   tick_interval_ms: 10000
///   seed_events: 1000
///   subscriber_buffer: 64
/// logging:
///   level: info
///   json: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KickstreamConfig {
    /// Listener settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Event production and fan-out settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KickstreamConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `KICKSTREAM_HOST` overrides `http.host`
    /// - `KICKSTREAM_PORT` overrides `http.port`
    /// - `KICKSTREAM_TICK_INTERVAL_MS` overrides `feed.tick_interval_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    /// Environment overrides apply either way.
    ///
    /// Nothing is logged here; the returned [`LoadedConfig`] records what
    /// happened so the caller can report it once logging is up.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) when the file exists; the
    /// default path can still fail validation through an env override.
    pub fn load_or_default(path: &Path) -> Result<LoadedConfig, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`load_or_default`](Self::load_or_default) with an explicit
    /// environment lookup.
    ///
    /// # Errors
    ///
    /// Same as [`load_or_default`](Self::load_or_default).
    pub fn load_with(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        let file_found = path.exists();
        let mut config = if file_found {
            serde_yml::from_str(&std::fs::read_to_string(path)?)?
        } else {
            Self::default()
        };
        let ignored_overrides = config.apply_overrides(lookup);
        config.validate()?;
        Ok(LoadedConfig {
            config,
            file_found,
            ignored_overrides,
        })
    }

    /// Apply `KICKSTREAM_*` environment overrides.
    ///
    /// Numeric overrides that fail to parse are skipped and the existing
    /// value is kept. Returns the keys that were skipped.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut ignored = Vec::new();
        if let Some(val) = lookup("KICKSTREAM_HOST") {
            self.http.host = val;
        }
        if let Some(port) = override_number::<u16>(&lookup, "KICKSTREAM_PORT", &mut ignored) {
            self.http.port = port;
        }
        if let Some(ms) =
            override_number::<u64>(&lookup, "KICKSTREAM_TICK_INTERVAL_MS", &mut ignored)
        {
            self.feed.tick_interval_ms = ms;
        }
        ignored
    }

    /// Check invariants the rest of the system relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero tick interval or a zero
    /// subscriber buffer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "feed.tick_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.feed.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid {
                reason: "feed.subscriber_buffer must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

fn override_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    ignored: &mut Vec<String>,
) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        ignored.push(key.to_owned());
    }
    parsed
}

/// Result of [`KickstreamConfig::load_or_default`].
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The validated configuration.
    pub config: KickstreamConfig,
    /// Whether the config file existed.
    pub file_found: bool,
    /// Environment overrides that were present but malformed.
    pub ignored_overrides: Vec<String>,
}

/// HTTP/WebSocket listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Event production and fan-out settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Real-time milliseconds between generated events.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Events generated into the log at startup, before any client can
    /// connect.
    #[serde(default = "default_seed_events")]
    pub seed_events: usize,

    /// Per-subscriber push queue depth. A subscriber whose queue is full
    /// when an event is published is considered stalled and detached.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl FeedConfig {
    /// The tick period as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            seed_events: default_seed_events(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8888
}

const fn default_tick_interval_ms() -> u64 {
    10_000
}

const fn default_seed_events() -> usize {
    1000
}

const fn default_subscriber_buffer() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_reference_deployment() {
        let config = KickstreamConfig::default();
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 8888);
        assert_eq!(config.feed.tick_interval_ms, 10_000);
        assert_eq!(config.feed.seed_events, 1000);
        assert_eq!(config.feed.subscriber_buffer, 64);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
http:
  host: "127.0.0.1"
  port: 9000
feed:
  tick_interval_ms: 250
  seed_events: 0
  subscriber_buffer: 8
logging:
  level: debug
  json: true
"#;
        let config: KickstreamConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.feed.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.feed.seed_events, 0);
        assert_eq!(config.feed.subscriber_buffer, 8);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_partial_yaml_uses_defaults() {
        let yaml = "feed:\n  seed_events: 5\n";
        let config: KickstreamConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.feed.seed_events, 5);
        assert_eq!(config.feed.tick_interval_ms, 10_000);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let mut config = KickstreamConfig::default();
        config.feed.tick_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn zero_subscriber_buffer_is_rejected() {
        let mut config = KickstreamConfig::default();
        config.feed.subscriber_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loaded =
            KickstreamConfig::load_with(Path::new("no-such-kickstream.yaml"), |_| None).unwrap();
        assert!(!loaded.file_found);
        assert!(loaded.ignored_overrides.is_empty());
        assert_eq!(loaded.config, KickstreamConfig::default());
    }

    #[test]
    fn malformed_override_is_reported_and_skipped() {
        let loaded = KickstreamConfig::load_with(Path::new("no-such-kickstream.yaml"), |key| {
            match key {
                "KICKSTREAM_PORT" => Some(String::from("not-a-port")),
                "KICKSTREAM_HOST" => Some(String::from("127.0.0.1")),
                "KICKSTREAM_TICK_INTERVAL_MS" => Some(String::from("250")),
                _ => None,
            }
        })
        .unwrap();
        assert_eq!(loaded.ignored_overrides, ["KICKSTREAM_PORT"]);
        assert_eq!(loaded.config.http.port, 8888);
        assert_eq!(loaded.config.http.host, "127.0.0.1");
        assert_eq!(loaded.config.feed.tick_interval_ms, 250);
    }

    #[test]
    fn zero_interval_override_fails_validation() {
        let result = KickstreamConfig::load_with(Path::new("no-such-kickstream.yaml"), |key| {
            (key == "KICKSTREAM_TICK_INTERVAL_MS").then(|| String::from("0"))
        });
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = serde_yml::from_str::<KickstreamConfig>("http: [unclosed");
        assert!(result.is_err());
    }
}
