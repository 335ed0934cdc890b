//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound on waiting for per-account posting locks, in milliseconds.
    #[serde(default = "default_posting_timeout_ms")]
    pub posting_timeout_ms: u64,
    /// Maximum date distance for matching an external line to a ledger line.
    #[serde(default = "default_tolerance_days")]
    pub reconciliation_date_tolerance_days: u32,
    /// Currency code that reports are labelled with.
    #[serde(default = "default_functional_currency")]
    pub functional_currency: String,
}

fn default_posting_timeout_ms() -> u64 {
    5_000
}

fn default_tolerance_days() -> u32 {
    3
}

fn default_functional_currency() -> String {
    "USD".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            posting_timeout_ms: default_posting_timeout_ms(),
            reconciliation_date_tolerance_days: default_tolerance_days(),
            functional_currency: default_functional_currency(),
        }
    }
}

impl DatabaseConfig {
    /// Pool settings at their defaults for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

impl LedgerConfig {
    /// Returns the posting lock timeout as a `Duration`.
    #[must_use]
    pub fn posting_timeout(&self) -> Duration {
        Duration::from_millis(self.posting_timeout_ms)
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("TALLY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.posting_timeout(), Duration::from_secs(5));
        assert_eq!(ledger.reconciliation_date_tolerance_days, 3);
        assert_eq!(ledger.functional_currency, "USD");
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__LEDGER__POSTING_TIMEOUT_MS", Some("250")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.posting_timeout_ms, 250);
                assert_eq!(config.ledger.reconciliation_date_tolerance_days, 3);
            },
        );
    }
}
