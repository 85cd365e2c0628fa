//! Storage settings, deserialized from the `database` section of
//! `codepad-config.yaml`.

use std::time::Duration;

use serde::Deserialize;

/// Storage backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection string. When unset the server uses the
    /// in-memory store.
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a request may wait for a pooled connection.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Apply pending migrations on connect.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl DatabaseSettings {
    /// Settings for `url` with every other field at its default.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// [`acquire_timeout_secs`](Self::acquire_timeout_secs) as a duration.
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            run_migrations: default_true(),
        }
    }
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_acquire_timeout_secs() -> u64 {
    5
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_memory_backend() {
        let settings = DatabaseSettings::default();
        assert_eq!(settings.url, None);
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.acquire_timeout(), Duration::from_secs(5));
        assert!(settings.run_migrations);
    }

    #[test]
    fn for_url_keeps_defaults() {
        let settings = DatabaseSettings::for_url("postgresql://localhost/codepad");
        assert_eq!(settings.url.as_deref(), Some("postgresql://localhost/codepad"));
        assert_eq!(settings.max_connections, 10);
    }
}
