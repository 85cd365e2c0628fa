//! Configuration loading and typed config structures for the Codepad server.
//!
//! The configuration lives in `codepad-config.yaml` at the project root.
//! Every section is optional; missing keys fall back to the `default_*`
//! functions at the bottom of this module.

use std::path::Path;

use codepad_types::{Meeting, MeetingId, UserId};
use serde::Deserialize;

pub use codepad_db::DatabaseSettings;

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

    /// An environment override held a value of the wrong shape.
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// The environment variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CodepadConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Storage backend settings.
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Meetings preloaded into the in-memory backend.
    ///
    /// Ignored when a database URL is configured.
    #[serde(default)]
    pub meetings: Vec<SeedMeeting>,
}

impl CodepadConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// - `DATABASE_URL` overrides `database.url`
    /// - `CODEPAD_HOST` overrides `server.host`
    /// - `CODEPAD_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override cannot be parsed.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults. Environment
    /// overrides apply either way.
    ///
    /// # Errors
    ///
    /// See [`CodepadConfig::from_file`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }

    /// Override settings with process environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `CODEPAD_PORT` is not a port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Override settings using `lookup` as the variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `CODEPAD_PORT` is not a port.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("DATABASE_URL") {
            self.database.url = Some(val);
        }
        if let Some(val) = lookup("CODEPAD_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("CODEPAD_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => {
                    tracing::debug!(error = %e, "rejecting CODEPAD_PORT");
                    return Err(ConfigError::InvalidEnv {
                        var: "CODEPAD_PORT",
                        value: val,
                    });
                }
            }
        }
        Ok(())
    }

    /// The seed meetings as domain records.
    pub fn seed_meetings(&self) -> Vec<Meeting> {
        self.meetings.iter().cloned().map(Meeting::from).collect()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit newline-delimited JSON instead of human-readable lines.
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

/// A meeting declared in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedMeeting {
    /// Meeting ID.
    pub id: MeetingId,

    /// Interviewer subjects.
    #[serde(default)]
    pub interviewer_ids: Vec<UserId>,

    /// Pre-bound candidate, if any.
    #[serde(default)]
    pub candidate_id: Option<UserId>,
}

impl From<SeedMeeting> for Meeting {
    fn from(seed: SeedMeeting) -> Self {
        Self {
            id: seed.id,
            interviewer_ids: seed.interviewer_ids,
            candidate_id: seed.candidate_id,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
