//! Series loading for the runner.
//!
//! Resolution order for one symbol:
//! 1. Stored rows exist → the requested range (weekend ends rolled inward)
//!    must lie inside them
//! 2. Nothing stored, provider available and not offline → fetch, store, re-query
//! 3. Otherwise → fail with a clear error
//!
//! Bars failing the sanity check are logged and kept.

use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;
use tracing::{info, warn};

use backtest_core::data::{CsvBarStore, DataError, DataProvider};
use backtest_core::MarketSeries;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no stored data for '{symbol}' and no network access")]
    NoStoredDataOffline { symbol: String },

    #[error("no stored data for '{symbol}' and no provider configured (set POLYGON_API_KEY)")]
    NoProvider { symbol: String },

    #[error("requested {start}..={end} for '{symbol}' but stored data covers {available_start}..={available_end}")]
    RangeUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
        available_start: NaiveDate,
        available_end: NaiveDate,
    },

    #[error("no bars for '{symbol}' between {start} and {end}")]
    Empty {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Start date (inclusive).
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
    /// If true, never make network requests.
    pub offline: bool,
}

/// Load the bars for `symbol` over `opts.start..=opts.end` as a sorted series.
pub fn load_series(
    symbol: &str,
    store: &CsvBarStore,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<MarketSeries, LoadError> {
    let mut fetched_now = false;
    if store.available_range(symbol)?.is_none() {
        if opts.offline {
            return Err(LoadError::NoStoredDataOffline {
                symbol: symbol.to_string(),
            });
        }
        let Some(provider) = provider else {
            return Err(LoadError::NoProvider {
                symbol: symbol.to_string(),
            });
        };
        info!(
            symbol,
            provider = provider.name(),
            start = %opts.start,
            end = %opts.end,
            "fetching price data"
        );
        let fetched = provider.fetch(symbol, opts.start, opts.end)?;
        store.insert(symbol, &fetched.bars)?;
        fetched_now = true;
    }

    // The provider was just asked for exactly this range; whatever trading
    // days it returned are the coverage.
    if !fetched_now {
        if let Some((available_start, available_end)) = store.available_range(symbol)? {
            let (first_weekday, last_weekday) = weekday_bounds(opts.start, opts.end);
            if first_weekday < available_start || last_weekday > available_end {
                return Err(LoadError::RangeUnavailable {
                    symbol: symbol.to_string(),
                    start: opts.start,
                    end: opts.end,
                    available_start,
                    available_end,
                });
            }
        }
    }

    let bars = store.query(symbol, opts.start, opts.end)?;
    if bars.is_empty() {
        return Err(LoadError::Empty {
            symbol: symbol.to_string(),
            start: opts.start,
            end: opts.end,
        });
    }

    for bar in bars.iter().filter(|b| !b.is_sane()) {
        warn!(symbol, date = %bar.date, close = bar.close, "bar failed sanity check");
    }

    let series = MarketSeries::sorted(bars);
    info!(symbol, bars = series.len(), "loaded series");
    Ok(series)
}

/// Pull both ends of a calendar range in to the nearest weekday, so a range
/// starting or ending on a weekend is compared by its trading days.
fn weekday_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    let mut first = start;
    while is_weekend(first) && first < end {
        first = first.succ_opt().unwrap_or(first);
    }
    let mut last = end;
    while is_weekend(last) && last > first {
        last = last.pred_opt().unwrap_or(last);
    }
    (first, last)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
