//! Portfolio — cash and shares of the single traded instrument.

use serde::{Deserialize, Serialize};

/// Cash and share holdings during a simulation.
///
/// `initial_cash_balance` is fixed at construction and is the reference for
/// position sizing and profit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash_balance: f64,
    pub shares_owned: f64,
    initial_cash_balance: f64,
}

impl PortfolioState {
    pub fn new(initial_cash_balance: f64) -> Self {
        Self {
            cash_balance: initial_cash_balance,
            shares_owned: 0.0,
            initial_cash_balance,
        }
    }

    pub fn initial_cash_balance(&self) -> f64 {
        self.initial_cash_balance
    }

    /// Cash plus shares valued at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash_balance + self.shares_owned * price
    }

    pub fn is_flat(&self) -> bool {
        self.shares_owned <= 0.0
    }
}
