//! Factory — maps a strategy name to a configured `SignalStrategy`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{EmaStrategy, RiskConfig, SignalStrategy, SmaStrategy, StrategyError};

/// Available strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "SMA", alias = "sma", alias = "Sma")]
    Sma,
    #[serde(rename = "EMA", alias = "ema", alias = "Ema")]
    Ema,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Sma, StrategyKind::Ema];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sma => "SMA",
            StrategyKind::Ema => "EMA",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::Sma => "Simple Moving Average",
            StrategyKind::Ema => "Exponential Moving Average",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    /// Case-insensitive: "sma", "SMA" and " Ema " all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SMA" => Ok(StrategyKind::Sma),
            "EMA" => Ok(StrategyKind::Ema),
            _ => Err(StrategyError::UnknownStrategy(s.trim().to_string())),
        }
    }
}

/// Names of every strategy the factory can build.
pub fn available_strategies() -> Vec<&'static str> {
    StrategyKind::ALL.iter().map(|k| k.as_str()).collect()
}

/// Build a strategy of the given kind. The config is validated first.
pub fn create_strategy(
    kind: StrategyKind,
    config: RiskConfig,
) -> Result<Box<dyn SignalStrategy>, StrategyError> {
    match kind {
        StrategyKind::Sma => Ok(Box::new(SmaStrategy::new(config)?)),
        StrategyKind::Ema => Ok(Box::new(EmaStrategy::new(config)?)),
    }
}

/// Build a strategy from its name ("SMA" / "EMA", any case).
pub fn create_strategy_by_name(
    name: &str,
    config: RiskConfig,
) -> Result<Box<dyn SignalStrategy>, StrategyError> {
    create_strategy(name.parse()?, config)
}
