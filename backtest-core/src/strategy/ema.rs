//! Exponential-moving-average strategy.

use super::{RiskConfig, SignalStrategy, StrategyError, StrategyKind};
use crate::domain::MarketSeries;
use crate::indicators::{Ema, Indicator};

/// EMA variant of `SignalStrategy`.
///
/// The indicator series is compact: slot 0 is the seed (mean of the first
/// `window` closes) and slot `k` is the EMA through bar `window - 1 + k`, so
/// its length is `len - window + 1`. Step `i` therefore compares bar `i - 1`
/// against the EMA through that same bar.
#[derive(Debug, Clone)]
pub struct EmaStrategy {
    config: RiskConfig,
    ema: Ema,
}

impl EmaStrategy {
    pub fn new(config: RiskConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            ema: Ema::new(config.observation_window()),
            config,
        })
    }

    pub fn multiplier(&self) -> f64 {
        self.ema.multiplier()
    }
}

impl SignalStrategy for EmaStrategy {
    fn name(&self) -> &str {
        "EMA"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Ema
    }

    fn config(&self) -> &RiskConfig {
        &self.config
    }

    fn indicator_series(&self, series: &MarketSeries) -> Vec<f64> {
        let mut aligned = self.ema.compute(series.bars());
        let warmup = self.ema.lookback().min(aligned.len());
        aligned.split_off(warmup)
    }
}
