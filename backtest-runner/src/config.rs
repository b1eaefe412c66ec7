//! Serializable backtest configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! start_date = "2024-01-02"
//! end_date = "2024-11-20"
//! initial_cash = 10000.0
//!
//! [strategy]
//! kind = "SMA"
//! observation_window = 10
//! stop_loss_pct = 0.10
//! take_profit_pct = 0.20
//!
//! [data]
//! store_dir = "data"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use backtest_core::strategy::{
    RiskConfig, StrategyError, StrategyKind, DEFAULT_OBSERVATION_WINDOW, DEFAULT_STOP_LOSS_PCT,
    DEFAULT_TAKE_PROFIT_PCT,
};

/// Environment variable consulted when `[data] api_key` is absent.
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<StrategyError> for ConfigError {
    fn from(e: StrategyError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
    pub data: DataSection,
}

/// `[backtest]`: what to run over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: "AAPL".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 11, 20).unwrap_or_default(),
            initial_cash: 10_000.0,
        }
    }
}

/// `[strategy]`: which strategy and its risk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub kind: StrategyKind,
    pub observation_window: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Sma,
            observation_window: DEFAULT_OBSERVATION_WINDOW,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
            take_profit_pct: DEFAULT_TAKE_PROFIT_PCT,
        }
    }
}

/// `[data]`: where bars live and how to fetch more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub store_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("data"),
            api_key: None,
        }
    }
}

impl BacktestConfig {
    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_risk_config(&self) -> RiskConfig {
        RiskConfig::new(
            self.strategy.observation_window,
            self.strategy.stop_loss_pct,
            self.strategy.take_profit_pct,
        )
    }

    /// Check cross-field constraints and the risk parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if bt.start_date > bt.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                bt.start_date, bt.end_date
            )));
        }
        if !bt.initial_cash.is_finite() || bt.initial_cash <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_cash must be a positive number, got {}",
                bt.initial_cash
            )));
        }
        self.to_risk_config().validate()?;
        Ok(())
    }

    /// The configured API key, else the `POLYGON_API_KEY` environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.data
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}
