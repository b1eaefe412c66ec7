//! Risk configuration shared by every strategy variant.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::StrategyError;

/// Default number of bars in the moving-average window.
pub const DEFAULT_OBSERVATION_WINDOW: usize = 10;
/// Default stop-loss distance as a fraction of the entry price.
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.10;
/// Default take-profit distance as a fraction of the entry price.
pub const DEFAULT_TAKE_PROFIT_PCT: f64 = 0.20;
/// Windows shorter than this are accepted but logged as a warning.
pub const RECOMMENDED_MIN_WINDOW: usize = 5;

/// Immutable risk parameters for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    observation_window: usize,
    stop_loss_pct: f64,
    take_profit_pct: f64,
}

impl RiskConfig {
    pub fn new(observation_window: usize, stop_loss_pct: f64, take_profit_pct: f64) -> Self {
        Self {
            observation_window,
            stop_loss_pct,
            take_profit_pct,
        }
    }

    pub fn builder() -> RiskConfigBuilder {
        RiskConfigBuilder::default()
    }

    pub fn observation_window(&self) -> usize {
        self.observation_window
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    /// Stop-loss trigger level for a position entered at `entry_price`.
    pub fn stop_loss_level(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.stop_loss_pct)
    }

    /// Take-profit trigger level for a position entered at `entry_price`.
    pub fn take_profit_level(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 + self.take_profit_pct)
    }

    /// Reject configurations the strategies cannot run with.
    ///
    /// A zero window and percentages that are non-finite or outside `[0, 1]`
    /// are errors. Windows below `RECOMMENDED_MIN_WINDOW` pass with a warning.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.observation_window == 0 {
            return Err(StrategyError::InvalidConfiguration(
                "observation window must be at least 1".into(),
            ));
        }
        check_fraction("stop_loss_pct", self.stop_loss_pct)?;
        check_fraction("take_profit_pct", self.take_profit_pct)?;
        if self.observation_window < RECOMMENDED_MIN_WINDOW {
            warn!(
                window = self.observation_window,
                recommended = RECOMMENDED_MIN_WINDOW,
                "observation window is below the recommended minimum"
            );
        }
        Ok(())
    }
}

fn check_fraction(field: &str, value: f64) -> Result<(), StrategyError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(StrategyError::InvalidConfiguration(format!(
            "{field} must be a fraction in [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_OBSERVATION_WINDOW,
            DEFAULT_STOP_LOSS_PCT,
            DEFAULT_TAKE_PROFIT_PCT,
        )
    }
}

/// Builder for `RiskConfig`; unset fields keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct RiskConfigBuilder {
    observation_window: Option<usize>,
    stop_loss_pct: Option<f64>,
    take_profit_pct: Option<f64>,
}

impl RiskConfigBuilder {
    pub fn observation_window(mut self, bars: usize) -> Self {
        self.observation_window = Some(bars);
        self
    }

    pub fn stop_loss_pct(mut self, pct: f64) -> Self {
        self.stop_loss_pct = Some(pct);
        self
    }

    pub fn take_profit_pct(mut self, pct: f64) -> Self {
        self.take_profit_pct = Some(pct);
        self
    }

    pub fn build(self) -> RiskConfig {
        RiskConfig::new(
            self.observation_window.unwrap_or(DEFAULT_OBSERVATION_WINDOW),
            self.stop_loss_pct.unwrap_or(DEFAULT_STOP_LOSS_PCT),
            self.take_profit_pct.unwrap_or(DEFAULT_TAKE_PROFIT_PCT),
        )
    }
}
