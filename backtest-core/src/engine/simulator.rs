//! Portfolio simulator — turns a signal list into cash/share changes and a
//! profit summary.
//!
//! Sizing policy: every BUY commits `TRADE_RISK_PCT` of the *initial* cash
//! balance, whatever the current cash or equity. Cash is allowed to go
//! negative when several BUYs stack up (there is no margin check).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::portfolio::PortfolioState;
use crate::domain::{SignalKind, TradeSignal};

/// Fraction of the initial cash balance committed by each BUY.
pub const TRADE_RISK_PCT: f64 = 0.20;

/// One signal that changed the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub kind: SignalKind,
    pub date: NaiveDate,
    pub price: f64,
    pub shares: f64,
    pub cash_after: f64,
}

/// Final state of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub initial_cash_balance: f64,
    pub final_cash_balance: f64,
    pub shares_owned: f64,
    pub last_execution_price: f64,
    pub net_profit: f64,
    pub net_profit_pct: f64,
}

/// Single-use replay engine. `run` and `finish` consume the simulator.
#[derive(Debug, Clone)]
pub struct PortfolioSimulator {
    portfolio: PortfolioState,
    last_execution_price: f64,
}

impl PortfolioSimulator {
    pub fn new(initial_cash_balance: f64) -> Self {
        Self {
            portfolio: PortfolioState::new(initial_cash_balance),
            last_execution_price: 0.0,
        }
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    pub fn last_execution_price(&self) -> f64 {
        self.last_execution_price
    }

    /// Apply one signal. Returns the execution if holdings changed.
    ///
    /// The signal price becomes the last execution price even when the
    /// signal is a no-op (SELL while flat).
    pub fn step(&mut self, signal: &TradeSignal) -> Option<Execution> {
        self.last_execution_price = signal.price;
        match signal.kind {
            SignalKind::Buy => self.execute_buy(signal),
            SignalKind::Sell => self.execute_sell(signal),
        }
    }

    fn execute_buy(&mut self, signal: &TradeSignal) -> Option<Execution> {
        let trade_risk_amount = TRADE_RISK_PCT * self.portfolio.initial_cash_balance();
        let shares_to_buy = trade_risk_amount / signal.price;
        if shares_to_buy.is_nan() || shares_to_buy <= 0.0 {
            return None;
        }

        self.portfolio.cash_balance -= shares_to_buy * signal.price;
        self.portfolio.shares_owned += shares_to_buy;
        info!(
            shares = shares_to_buy,
            price = signal.price,
            date = %signal.date,
            cash = self.portfolio.cash_balance,
            "executed BUY"
        );
        Some(Execution {
            kind: SignalKind::Buy,
            date: signal.date,
            price: signal.price,
            shares: shares_to_buy,
            cash_after: self.portfolio.cash_balance,
        })
    }

    fn execute_sell(&mut self, signal: &TradeSignal) -> Option<Execution> {
        if self.portfolio.shares_owned <= 0.0 {
            return None;
        }

        let shares = self.portfolio.shares_owned;
        self.portfolio.cash_balance += shares * signal.price;
        self.portfolio.shares_owned = 0.0;
        info!(
            shares,
            price = signal.price,
            date = %signal.date,
            cash = self.portfolio.cash_balance,
            "executed SELL"
        );
        Some(Execution {
            kind: SignalKind::Sell,
            date: signal.date,
            price: signal.price,
            shares,
            cash_after: self.portfolio.cash_balance,
        })
    }

    /// Close the books. An open position is marked to the last execution price.
    pub fn finish(self) -> Summary {
        let initial = self.portfolio.initial_cash_balance();
        let net_profit = self.portfolio.cash_balance - initial
            + self.last_execution_price * self.portfolio.shares_owned;
        let net_profit_pct = net_profit / initial * 100.0;

        let summary = Summary {
            initial_cash_balance: initial,
            final_cash_balance: self.portfolio.cash_balance,
            shares_owned: self.portfolio.shares_owned,
            last_execution_price: self.last_execution_price,
            net_profit,
            net_profit_pct,
        };
        info!(
            final_cash = summary.final_cash_balance,
            shares = summary.shares_owned,
            last_price = summary.last_execution_price,
            net_profit = summary.net_profit,
            net_profit_pct = summary.net_profit_pct,
            "portfolio summary"
        );
        summary
    }

    /// Replay `signals` in order and summarize.
    pub fn run(mut self, signals: &[TradeSignal]) -> Summary {
        for signal in signals {
            self.step(signal);
        }
        self.finish()
    }
}
