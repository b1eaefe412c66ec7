//! Integration tests for the runner's data pipeline.
//!
//! A mock provider stands in for the network; the store lives in a temp dir.

use std::sync::atomic::{AtomicUsize, Ordering};

use backtest_core::data::{CsvBarStore, DataError, DataProvider, FetchResult};
use backtest_core::PriceBar;
use backtest_runner::data_loader::{load_series, LoadError, LoadOptions};
use chrono::{Datelike, NaiveDate, Weekday};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn bars(symbol: &str, start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let day = start + chrono::Duration::days(i as i64);
            PriceBar::new(symbol, day, c, c + 1.0, c - 1.0, c, 500)
        })
        .collect()
}

/// Serves a fixed set of bars and counts calls.
struct MockProvider {
    bars: Vec<PriceBar>,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            bars,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect(),
        })
    }
}

/// Like an exchange calendar: one bar per weekday, nothing on weekends.
struct WeekdayProvider;

impl DataProvider for WeekdayProvider {
    fn name(&self) -> &str {
        "weekday"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|d| PriceBar::new(symbol, d, 10.0, 11.0, 9.0, 10.0, 100))
            .collect();
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
        })
    }
}

/// Always fails like a missing API key.
struct FailingProvider;

impl DataProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn fetch(
        &self,
        _symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Err(DataError::AuthenticationRequired("no key".into()))
    }
}

fn opts(start: NaiveDate, end: NaiveDate, offline: bool) -> LoadOptions {
    LoadOptions {
        start,
        end,
        offline,
    }
}

#[test]
fn empty_store_fetches_once_then_reads_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    let provider = MockProvider::new(bars("AAPL", date(2024, 1, 1), &[10.0; 30]));
    let o = opts(date(2024, 1, 1), date(2024, 1, 30), false);

    let first = load_series("AAPL", &store, Some(&provider), &o).unwrap();
    assert_eq!(first.len(), 30);
    assert_eq!(provider.calls(), 1);
    assert!(store.contains("AAPL"));

    let second = load_series("AAPL", &store, Some(&provider), &o).unwrap();
    assert_eq!(second, first);
    assert_eq!(provider.calls(), 1);
}

#[test]
fn weekend_endpoints_load_after_fetch_and_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    // Saturday 2024-01-06 .. Sunday 2024-03-03
    let o = opts(date(2024, 1, 6), date(2024, 3, 3), false);

    let fetched = load_series("SPY", &store, Some(&WeekdayProvider), &o).unwrap();
    assert_eq!(fetched.first_date(), Some(date(2024, 1, 8)));
    assert_eq!(fetched.last_date(), Some(date(2024, 3, 1)));
    assert_eq!(
        store.available_range("SPY").unwrap(),
        Some((date(2024, 1, 8), date(2024, 3, 1)))
    );

    let offline = opts(date(2024, 1, 6), date(2024, 3, 3), true);
    let stored = load_series("SPY", &store, None, &offline).unwrap();
    assert_eq!(stored, fetched);
}

#[test]
fn stored_subrange_is_filtered_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    let mut rows = bars("MSFT", date(2024, 3, 1), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    rows.reverse();
    store.insert("MSFT", &rows).unwrap();

    let o = opts(date(2024, 3, 2), date(2024, 3, 4), true);
    let series = load_series("MSFT", &store, None, &o).unwrap();
    assert_eq!(series.closes(), vec![2.0, 3.0, 4.0]);
    assert!(series.is_chronological());
}

#[test]
fn range_outside_stored_data_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    store
        .insert("SPY", &bars("SPY", date(2024, 1, 2), &[1.0; 10]))
        .unwrap();

    let o = opts(date(2023, 12, 1), date(2024, 1, 5), true);
    let err = load_series("SPY", &store, None, &o).unwrap_err();
    match err {
        LoadError::RangeUnavailable {
            available_start,
            available_end,
            ..
        } => {
            assert_eq!(available_start, date(2024, 1, 2));
            assert_eq!(available_end, date(2024, 1, 11));
        }
        other => panic!("expected RangeUnavailable, got {other:?}"),
    }
}

#[test]
fn offline_with_empty_store_fails_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    let provider = MockProvider::new(bars("QQQ", date(2024, 1, 1), &[1.0; 5]));

    let o = opts(date(2024, 1, 1), date(2024, 1, 5), true);
    let err = load_series("QQQ", &store, Some(&provider), &o).unwrap_err();
    assert!(matches!(err, LoadError::NoStoredDataOffline { .. }));
    assert_eq!(provider.calls(), 0);
}

#[test]
fn missing_provider_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    let o = opts(date(2024, 1, 1), date(2024, 1, 5), false);
    let err = load_series("IBM", &store, None, &o).unwrap_err();
    assert!(matches!(err, LoadError::NoProvider { .. }));
}

#[test]
fn provider_errors_surface_as_data_errors() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    let o = opts(date(2024, 1, 1), date(2024, 1, 5), false);
    let err = load_series("IBM", &store, Some(&FailingProvider), &o).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Data(DataError::AuthenticationRequired(_))
    ));
    assert!(!store.contains("IBM"));
}

#[test]
fn insane_bars_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvBarStore::new(dir.path());
    let mut rows = bars("ODD", date(2024, 1, 1), &[5.0, 6.0, 7.0]);
    rows[1].high = 1.0;
    store.insert("ODD", &rows).unwrap();

    let o = opts(date(2024, 1, 1), date(2024, 1, 3), true);
    let series = load_series("ODD", &store, None, &o).unwrap();
    assert_eq!(series.len(), 3);
    assert!(!series.bars()[1].is_sane());
}
