//! Server configuration
//!
//! Read from TOML; every section and field is optional and falls back to its
//! default. `FOLIO_BIND` overrides `server.bind` after loading.

use folio_events::{CoalesceConfig, HistoryConfig, SessionConfig};
use folio_versions::VersionsConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the bind address
pub const BIND_ENV: &str = "FOLIO_BIND";

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid bind address '{0}'")]
    Bind(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP listener and logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

/// Per-document session tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub coalesce_window_ms: u64,
    pub max_pending_edits: usize,
    pub checkpoint_interval: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            coalesce_window_ms: u64::try_from(session.coalesce.window.as_millis())
                .unwrap_or(u64::MAX),
            max_pending_edits: session.coalesce.max_pending,
            checkpoint_interval: session.history.checkpoint_interval,
        }
    }
}

impl SessionSection {
    /// Session configuration for the event layer
    #[must_use]
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            coalesce: CoalesceConfig {
                window: Duration::from_millis(self.coalesce_window_ms),
                max_pending: self.max_pending_edits,
            },
            history: HistoryConfig {
                checkpoint_interval: self.checkpoint_interval,
            },
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub server: ServerSection,
    pub session: SessionSection,
    pub versions: VersionsConfig,
}

impl FolioConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file, apply `FOLIO_BIND` and validate
    ///
    /// # Errors
    /// Unreadable file, malformed TOML or invalid values
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&raw)?;
        config.apply_env(std::env::var(BIND_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without touching the environment
    ///
    /// # Errors
    /// Malformed TOML
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply a `FOLIO_BIND` value, if any
    pub fn apply_env(&mut self, bind: Option<String>) {
        if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
            self.server.bind = bind;
        }
    }

    /// With bind address
    #[inline]
    #[must_use]
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.server.bind = bind.into();
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.server.log_filter = filter.into();
        self
    }

    /// With JSON log output
    #[inline]
    #[must_use]
    pub fn with_log_json(mut self, json: bool) -> Self {
        self.server.log_json = json;
        self
    }

    /// With coalescing window
    #[inline]
    #[must_use]
    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.session.coalesce_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With automatic snapshot thresholds
    #[must_use]
    pub fn with_auto_snapshot(mut self, every_events: Option<usize>, every_secs: Option<u64>) -> Self {
        self.versions.auto_snapshot_every_events = every_events;
        self.versions.auto_snapshot_interval_secs = every_secs;
        self
    }

    /// Parsed bind address
    ///
    /// # Errors
    /// [`ConfigError::Bind`] if `server.bind` is not `host:port`
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::Bind(self.server.bind.clone()))
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        let versions = &self.versions;
        if versions.max_page_size == 0 {
            return Err(ConfigError::Invalid("versions.max_page_size must be > 0".into()));
        }
        if versions.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "versions.default_page_size must be > 0".into(),
            ));
        }
        if versions.default_page_size > versions.max_page_size {
            return Err(ConfigError::Invalid(
                "versions.default_page_size exceeds versions.max_page_size".into(),
            ));
        }
        if self.session.checkpoint_interval == 0 {
            return Err(ConfigError::Invalid(
                "session.checkpoint_interval must be > 0".into(),
            ));
        }
        if versions.auto_snapshot_every_events == Some(0) {
            return Err(ConfigError::Invalid(
                "versions.auto_snapshot_every_events must be > 0 when set".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Never for values built by this module
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = FolioConfig::new();
        config.validate().unwrap();
        assert_eq!(config.versions.max_page_size, 100);
        assert_eq!(config.session.to_session_config(), SessionConfig::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FolioConfig::from_toml(
            r#"
            [server]
            bind = "0.0.0.0:9000"

            [versions]
            auto_snapshot_every_events = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.log_filter, "info");
        assert_eq!(config.versions.auto_snapshot_every_events, Some(50));
        assert_eq!(config.versions.default_page_size, 20);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\ncoalesce_window_ms = 200\ncheckpoint_interval = 8").unwrap();

        let config = FolioConfig::load(file.path()).unwrap();
        let session = config.session.to_session_config();
        assert_eq!(session.coalesce.window, Duration::from_millis(200));
        assert_eq!(session.history.checkpoint_interval, 8);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FolioConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn env_override_replaces_bind() {
        let mut config = FolioConfig::new();
        config.apply_env(Some("10.0.0.1:1234".into()));
        assert_eq!(config.bind_addr().unwrap().port(), 1234);

        config.apply_env(Some("  ".into()));
        assert_eq!(config.server.bind, "10.0.0.1:1234");
    }

    #[test]
    fn validation_rejects_zero_sizes() {
        let mut config = FolioConfig::new();
        config.versions.default_page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = FolioConfig::new();
        config.session.checkpoint_interval = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = FolioConfig::new().with_bind("not an address");
        assert!(matches!(config.validate(), Err(ConfigError::Bind(_))));
    }

    #[test]
    fn rendered_toml_parses_back() {
        let config = FolioConfig::new()
            .with_log_json(true)
            .with_auto_snapshot(Some(10), Some(300));
        let parsed = FolioConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
