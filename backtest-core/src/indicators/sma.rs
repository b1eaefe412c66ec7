//! Simple Moving Average (SMA).
//!
//! Mean of the last `period` closes.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
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

        // Each window is summed independently, oldest bar first.
        for (i, slot) in result.iter_mut().enumerate().skip(self.period - 1) {
            let sum: f64 = bars[i + 1 - self.period..=i].iter().map(|b| b.close).sum();
            *slot = sum / self.period as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&bars);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().take(4).enumerate() {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_3_first_usable_value() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 5.0, 5.0, 5.0]);
        let result = Sma::new(3).compute(&bars);
        // (10+20+30)/3
        assert_approx(result[2], 20.0, DEFAULT_EPSILON);
        assert_approx(result[3], 55.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[5], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&bars);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_nan_only_taints_windows_that_contain_it() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        bars[2].close = f64::NAN;
        let result = Sma::new(3).compute(&bars);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Sma::new(5).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_lookback_and_name() {
        assert_eq!(Sma::new(20).lookback(), 19);
        assert_eq!(Sma::new(10).name(), "sma_10");
    }
}
