//! Signal strategies — moving-average entry/exit rules over a bar series.
//!
//! Every strategy shares the same shape: precompute an indicator series, then
//! walk the bars with a two-state position machine (FLAT / LONG).
//!
//! The walk runs `i` over `window..len` and compares the close of bar `i-1`
//! against `indicators[i - window]`. The one-bar offset is part of the
//! contract: changing it changes every simulated outcome.

pub mod config;
pub mod ema;
pub mod factory;
pub mod sma;

pub use config::{
    RiskConfig, RiskConfigBuilder, DEFAULT_OBSERVATION_WINDOW, DEFAULT_STOP_LOSS_PCT,
    DEFAULT_TAKE_PROFIT_PCT, RECOMMENDED_MIN_WINDOW,
};
pub use ema::EmaStrategy;
pub use factory::{available_strategies, create_strategy, create_strategy_by_name, StrategyKind};
pub use sma::SmaStrategy;

use thiserror::Error;
use tracing::debug;

use crate::domain::{MarketSeries, PriceBar, SignalKind, TradeSignal};

/// Errors raised while configuring or running a strategy.
#[derive(Debug, Error, PartialEq)]
pub enum StrategyError {
    #[error("insufficient market data: need at least {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid strategy configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

/// Per-run position state of a strategy.
///
/// Reset at the start of every simulation; after the run it holds the
/// terminal state (an open position at the end of data stays open).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionState {
    pub position_open: bool,
    pub entry_price: f64,
}

impl PositionState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the FLAT/LONG machine by one close against one indicator level.
    ///
    /// FLAT → LONG when `close < level`.
    /// LONG → FLAT when `close > level`, or the stop-loss or take-profit level
    /// derived from the entry price is touched.
    pub fn on_close(&mut self, close: f64, level: f64, config: &RiskConfig) -> Option<SignalKind> {
        if !self.position_open {
            if close < level {
                self.position_open = true;
                self.entry_price = close;
                return Some(SignalKind::Buy);
            }
            return None;
        }

        let stop_loss = config.stop_loss_level(self.entry_price);
        let take_profit = config.take_profit_level(self.entry_price);
        if close > level || close <= stop_loss || close >= take_profit {
            self.position_open = false;
            self.entry_price = 0.0;
            return Some(SignalKind::Sell);
        }
        None
    }
}

/// A moving-average signal strategy.
///
/// Implementations supply the indicator series; the trait supplies the walk.
/// `simulate_trades` is a pure function of (series, config).
pub trait SignalStrategy: Send + Sync {
    /// Display name ("SMA", "EMA").
    fn name(&self) -> &str;

    fn kind(&self) -> StrategyKind;

    fn config(&self) -> &RiskConfig;

    /// Indicator values, laid out so that loop step `i` reads slot `i - window`.
    fn indicator_series(&self, series: &MarketSeries) -> Vec<f64>;

    /// Generate the signal list for `series` with a fresh position state.
    fn simulate_trades(&self, series: &MarketSeries) -> Result<Vec<TradeSignal>, StrategyError> {
        let mut state = PositionState::default();
        self.simulate_trades_with(series, &mut state)
    }

    /// Generate the signal list using a caller-owned position state.
    ///
    /// The state is reset before the walk and left at its terminal value.
    fn simulate_trades_with(
        &self,
        series: &MarketSeries,
        state: &mut PositionState,
    ) -> Result<Vec<TradeSignal>, StrategyError> {
        let window = self.config().observation_window();
        if series.len() < window {
            return Err(StrategyError::InsufficientData {
                required: window,
                available: series.len(),
            });
        }

        state.reset();
        let indicators = self.indicator_series(series);
        let signals = walk_positions(series.bars(), &indicators, self.config(), state);
        debug!(
            strategy = self.name(),
            bars = series.len(),
            signals = signals.len(),
            position_open = state.position_open,
            "simulated trades"
        );
        Ok(signals)
    }
}

/// Shared FLAT/LONG walk over the bars.
fn walk_positions(
    bars: &[PriceBar],
    indicators: &[f64],
    config: &RiskConfig,
    state: &mut PositionState,
) -> Vec<TradeSignal> {
    let window = config.observation_window();
    let mut signals = Vec::new();

    for i in window..bars.len() {
        let bar = &bars[i - 1];
        let level = indicators.get(i - window).copied().unwrap_or(f64::NAN);

        if let Some(kind) = state.on_close(bar.close, level, config) {
            let signal = TradeSignal {
                kind,
                date: bar.date,
                price: bar.close,
            };
            debug!(%signal, indicator = level, "signal");
            signals.push(signal);
        }
    }

    signals
}
