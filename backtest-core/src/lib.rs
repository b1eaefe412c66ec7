//! Backtest Core — domain types, moving-average strategies, portfolio simulator.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (price bars, market series, trade signals)
//! - SMA and EMA indicators
//! - Signal strategies with a shared FLAT/LONG position machine
//! - Portfolio simulator with fixed-fraction sizing and P&L summary
//! - Market data provider (Polygon) and CSV bar store

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

pub use domain::{MarketSeries, PriceBar, SignalKind, TradeSignal};
pub use engine::{Execution, PortfolioSimulator, Summary};
pub use strategy::{
    create_strategy, PositionState, RiskConfig, SignalStrategy, StrategyError, StrategyKind,
};
