//! Serializable backfill configuration.
//!
//! Every field has a default, so an empty TOML file is a valid config that
//! downloads six months (180 days) of hourly klines for the symbols listed in
//! `symbols.csv`.

use crate::data::binance::{BINANCE_KLINES_URL, MAX_PAGE_SIZE};
use crate::data::retry::RetryPolicy;
use crate::data::symbols::SymbolSource;
use crate::data::walker::WalkerSettings;
use crate::domain::{BackfillRange, Interval};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a backfill run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackfillConfig {
    /// Klines REST endpoint.
    pub endpoint: String,

    /// Candle interval to download.
    pub interval: Interval,

    /// How far back from now the backfill starts.
    pub lookback_days: u32,

    /// Rows per request (exchange maximum is 1000).
    pub page_size: u32,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,

    /// Courtesy delay between requests for the same symbol.
    pub throttle_ms: u64,

    /// Directory receiving `<SYMBOL>_<interval>_klines.csv` files.
    pub output_dir: PathBuf,

    pub retry: RetrySettings,

    pub symbols: SymbolSource,
}

/// Retry section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            endpoint: BINANCE_KLINES_URL.to_string(),
            interval: Interval::H1,
            lookback_days: 6 * 30,
            page_size: MAX_PAGE_SIZE,
            request_timeout_secs: 10,
            throttle_ms: 500,
            output_dir: PathBuf::from("."),
            retry: RetrySettings::default(),
            symbols: SymbolSource::default(),
        }
    }
}

impl BackfillConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be in 1..={MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.lookback_days == 0 {
            return Err(ConfigError::Invalid("lookback_days must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn lookback(&self) -> TimeDelta {
        TimeDelta::days(self.lookback_days as i64)
    }

    pub fn walker_settings(&self) -> WalkerSettings {
        WalkerSettings {
            page_size: self.page_size,
            throttle: self.throttle(),
        }
    }

    /// `[now - lookback, now)`.
    pub fn range_ending_at(&self, now: DateTime<Utc>) -> BackfillRange {
        BackfillRange::trailing(now, self.lookback())
    }
}
