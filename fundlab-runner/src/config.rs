//! Serializable run configuration.
//!
//! A run is fully described by a TOML file: the concurrency ceiling, fetch
//! timeouts, where artifacts live, the quote board to read, and the fixed
//! entity set. `RunConfig::default()` carries the eight IBEX constituents
//! tracked out of the box.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fundlab_core::Entity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONCURRENCY: usize = 3;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 12;
const DEFAULT_QUOTE_TIMEOUT_SECS: u64 = 15;
const QUOTE_BOARD_URL: &str = "https://cincodias.elpais.com/mercados/bolsa/igbm/";
const QUOTE_LINK_BASE: &str = "https://cincodias.elpais.com";

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("ticker '{ticker}' is configured more than once")]
    DuplicateTicker { ticker: String },
}

/// Where and how to read the quote board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteBoardConfig {
    pub url: String,
    /// Prefix for the relative links found on board rows.
    pub link_base: String,
    #[serde(default = "default_quote_timeout")]
    pub timeout_secs: u64,
}

/// Full configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Maximum number of entities collected at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout for entity pages.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Root of the raw/, processed/ and analysis/ trees.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    pub quotes: QuoteBoardConfig,

    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl RunConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout { field: "fetch_timeout_secs" });
        }
        if self.quotes.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout { field: "quotes.timeout_secs" });
        }
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.ticker.as_str()) {
                return Err(ConfigError::DuplicateTicker { ticker: entity.ticker.clone() });
            }
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quotes.timeout_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            data_dir: default_data_dir(),
            quotes: QuoteBoardConfig {
                url: QUOTE_BOARD_URL.into(),
                link_base: QUOTE_LINK_BASE.into(),
                timeout_secs: DEFAULT_QUOTE_TIMEOUT_SECS,
            },
            entities: default_entities(),
        }
    }
}

/// The eight IBEX constituents tracked by default.
pub fn default_entities() -> Vec<Entity> {
    const BASE: &str = "https://cincodias.elpais.com/mercados/empresas";
    [
        ("BBVA", "BBVA", "bbva"),
        ("CaixaBank", "CABK", "caixabank"),
        ("Iberdrola", "IBE", "iberdrola"),
        ("Endesa", "ELE", "endesa"),
        ("Repsol", "REP", "repsol"),
        ("Telefónica", "TEF", "telefonica"),
        ("Inditex", "ITX", "inditex"),
        ("AENA", "AENA", "aena"),
    ]
    .into_iter()
    .map(|(name, ticker, slug)| Entity::new(name, ticker, format!("{BASE}/{slug}/")))
    .collect()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_quote_timeout() -> u64 {
    DEFAULT_QUOTE_TIMEOUT_SECS
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.entities.len(), 8);
    }

    #[test]
    fn toml_roundtrip() {
        let config = RunConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = RunConfig::from_toml(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let text = r#"
            [quotes]
            url = "https://example.test/board"
            link_base = "https://example.test"

            [[entities]]
            name = "Repsol"
            ticker = "REP"
            url = "https://example.test/repsol"
        "#;
        let config = RunConfig::from_toml(text).unwrap();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(12));
        assert_eq!(config.quote_timeout(), Duration::from_secs(15));
        assert_eq!(config.entities[0].ticker, "REP");
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = RunConfig::default();
        config.concurrency = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroConcurrency)));
    }

    #[test]
    fn rejects_duplicate_tickers() {
        let mut config = RunConfig::default();
        config.entities.push(Entity::new("BBVA bis", "BBVA", "https://example.test"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateTicker { ticker }) if ticker == "BBVA"
        ));
    }
}
