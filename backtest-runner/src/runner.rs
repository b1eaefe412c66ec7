//! Backtest runner — wires together data loading, strategy and simulator.
//!
//! Two entry points:
//! - `run_backtest()`: loads the series from the store, then runs. Used by the CLI.
//! - `run_on_series()`: takes a pre-loaded series, no I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use backtest_core::data::{CsvBarStore, DataProvider};
use backtest_core::strategy::{create_strategy, RiskConfig, StrategyError, StrategyKind};
use backtest_core::{Execution, MarketSeries, PortfolioSimulator, Summary, TradeSignal};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_series, LoadError, LoadOptions};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub strategy: StrategyKind,
    pub risk: RiskConfig,
    pub start_date: String,
    pub end_date: String,
    pub bar_count: usize,
    /// BLAKE3 over the bars the strategy saw.
    pub dataset_hash: String,
    pub signals: Vec<TradeSignal>,
    pub executions: Vec<Execution>,
    pub summary: Summary,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    /// Whether the run ended holding shares.
    pub fn position_open(&self) -> bool {
        self.summary.shares_owned > 0.0
    }
}

/// Run a single backtest from a `BacktestConfig`, loading bars from `store`.
pub fn run_backtest(
    config: &BacktestConfig,
    store: &CsvBarStore,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let series = load_series(&config.backtest.symbol, store, provider, opts)?;
    run_on_series(config, &series)
}

/// Run a backtest over a pre-loaded series, no I/O.
pub fn run_on_series(
    config: &BacktestConfig,
    series: &MarketSeries,
) -> Result<BacktestResult, RunError> {
    let risk = config.to_risk_config();
    let strategy = create_strategy(config.strategy.kind, risk)?;
    let signals = strategy.simulate_trades(series)?;

    let mut simulator = PortfolioSimulator::new(config.backtest.initial_cash);
    let executions: Vec<Execution> = signals.iter().filter_map(|s| simulator.step(s)).collect();
    let summary = simulator.finish();

    let symbol = series
        .bars()
        .first()
        .map(|b| b.symbol.clone())
        .unwrap_or_else(|| config.backtest.symbol.to_ascii_uppercase());
    let start_date = series
        .first_date()
        .map_or_else(|| config.backtest.start_date.to_string(), |d| d.to_string());
    let end_date = series
        .last_date()
        .map_or_else(|| config.backtest.end_date.to_string(), |d| d.to_string());

    info!(
        symbol = %symbol,
        strategy = strategy.name(),
        signals = signals.len(),
        executions = executions.len(),
        net_profit = summary.net_profit,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        symbol,
        strategy: config.strategy.kind,
        risk,
        start_date,
        end_date,
        bar_count: series.len(),
        dataset_hash: compute_dataset_hash(series),
        signals,
        executions,
        summary,
    })
}

/// Deterministic fingerprint of a series.
pub fn compute_dataset_hash(series: &MarketSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in series.bars() {
        hasher.update(bar.symbol.as_bytes());
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
