//! TradeSignal — a BUY or SELL decision emitted by a strategy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a trade signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Buy,
    Sell,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Buy => "BUY",
            SignalKind::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable trade decision: side, trigger date, and trigger price.
///
/// Alternation (BUY, SELL, BUY, ...) is guaranteed by the strategy's position
/// state, not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub kind: SignalKind,
    pub date: NaiveDate,
    pub price: f64,
}

impl TradeSignal {
    pub fn buy(date: NaiveDate, price: f64) -> Self {
        Self {
            kind: SignalKind::Buy,
            date,
            price,
        }
    }

    pub fn sell(date: NaiveDate, price: f64) -> Self {
        Self {
            kind: SignalKind::Sell,
            date,
            price,
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} at price {}", self.kind, self.date, self.price)
    }
}
