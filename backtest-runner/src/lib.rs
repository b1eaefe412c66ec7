//! Backtest Runner — configuration, data loading, single runs, reporting.
//!
//! This crate builds on `backtest-core` to provide:
//! - TOML run configuration with defaults
//! - Series loading from the CSV store with provider fallback
//! - Single-backtest runner producing a serializable result
//! - Text, JSON and CSV reports

pub mod config;
pub mod data_loader;
pub mod report;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, ConfigError, DataSection, StrategySection};
pub use data_loader::{load_series, LoadError, LoadOptions};
pub use runner::{run_backtest, run_on_series, BacktestResult, RunError, SCHEMA_VERSION};
