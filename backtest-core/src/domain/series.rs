//! MarketSeries — time-ordered bars for one instrument.

use super::bar::PriceBar;
use chrono::NaiveDate;

/// An immutable sequence of daily bars with non-decreasing dates.
///
/// `new` takes the bars as given. Callers that cannot vouch for the ordering
/// should go through `sorted`. Duplicate dates are tolerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSeries {
    bars: Vec<PriceBar>,
}

impl MarketSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    /// Build a series after a stable sort by date.
    pub fn sorted(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Whether dates are non-decreasing.
    pub fn is_chronological(&self) -> bool {
        self.bars.windows(2).all(|w| w[0].date <= w[1].date)
    }
}

impl From<Vec<PriceBar>> for MarketSeries {
    fn from(bars: Vec<PriceBar>) -> Self {
        Self::new(bars)
    }
}
