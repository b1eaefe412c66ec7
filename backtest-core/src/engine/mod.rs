//! Execution engine — replays trade signals against a cash/shares portfolio.

pub mod portfolio;
pub mod simulator;

pub use portfolio::PortfolioState;
pub use simulator::{Execution, PortfolioSimulator, Summary, TRADE_RISK_PCT};
