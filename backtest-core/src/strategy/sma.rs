//! Simple-moving-average strategy.
//!
//! Buys when the close dips below its SMA, sells when it recovers above it or
//! when the stop-loss / take-profit levels are hit.

use super::{RiskConfig, SignalStrategy, StrategyError, StrategyKind};
use crate::domain::MarketSeries;
use crate::indicators::{Indicator, Sma};

/// SMA variant of `SignalStrategy`.
///
/// The indicator series is aligned to the bars: slot `k` is the mean of the
/// `window` closes ending at bar `k`, and the first `window - 1` slots are NaN
/// placeholders. Because the walk reads slot `i - window`, the placeholders are
/// read during the first `window - 1` steps and never trigger a signal; the
/// first live comparison uses the mean of bars `[0, window - 1]`.
#[derive(Debug, Clone)]
pub struct SmaStrategy {
    config: RiskConfig,
    sma: Sma,
}

impl SmaStrategy {
    pub fn new(config: RiskConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            sma: Sma::new(config.observation_window()),
            config,
        })
    }
}

impl SignalStrategy for SmaStrategy {
    fn name(&self) -> &str {
        "SMA"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Sma
    }

    fn config(&self) -> &RiskConfig {
        &self.config
    }

    fn indicator_series(&self, series: &MarketSeries) -> Vec<f64> {
        self.sma.compute(series.bars())
    }
}
