//! Exponential Moving Average (EMA).
//!
//! Seed: EMA[period-1] = SMA of the first `period` closes.
//! Recursive: EMA[t] = (close[t] - EMA[t-1]) * multiplier + EMA[t-1],
//! with multiplier = 2 / (period + 1).
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            name: format!("ema_{period}"),
        }
    }

    /// Smoothing factor, derived from the period at construction.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let mut ema = 0.0;
        for bar in bars.iter().take(self.period) {
            ema += bar.close;
        }
        ema /= self.period as f64;
        result[self.period - 1] = ema;

        // NaN closes propagate through the recursion.
        for i in self.period..n {
            ema = (bars[i].close - ema) * self.multiplier + ema;
            result[i] = ema;
        }

        result
    }
}
