//! On-disk OHLCV store, one CSV file per symbol.
//!
//! Layout: `{root}/{SYMBOL}.csv` with header
//! `symbol,date,open,high,low,close,volume`.
//!
//! Rows are keyed by date: inserting a date that already exists replaces the
//! stored row. Writes go to a `.tmp` file that is renamed into place.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::provider::DataError;
use crate::domain::PriceBar;

/// CSV-backed bar store.
#[derive(Debug, Clone)]
pub struct CsvBarStore {
    root: PathBuf,
}

impl CsvBarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{}.csv", normalize(symbol)))
    }

    /// Whether any rows are stored for `symbol`.
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbol_path(symbol).is_file()
    }

    /// Every stored row for `symbol`, sorted by date. Empty if nothing is stored.
    pub fn load_all(&self, symbol: &str) -> Result<Vec<PriceBar>, DataError> {
        let path = self.symbol_path(symbol);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut bars = Vec::new();
        for row in reader.deserialize() {
            let bar: PriceBar = row?;
            bars.push(bar);
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    /// Merge `bars` into the stored rows for `symbol`. Returns the total row count.
    pub fn insert(&self, symbol: &str, bars: &[PriceBar]) -> Result<usize, DataError> {
        let symbol = normalize(symbol);
        let mut rows: BTreeMap<NaiveDate, PriceBar> = self
            .load_all(&symbol)?
            .into_iter()
            .map(|b| (b.date, b))
            .collect();
        for bar in bars {
            let mut bar = bar.clone();
            bar.symbol = symbol.clone();
            rows.insert(bar.date, bar);
        }

        fs::create_dir_all(&self.root)?;
        let path = self.symbol_path(&symbol);
        let tmp = path.with_extension("csv.tmp");
        let written = write_rows(&tmp, rows.values())
            .and_then(|()| fs::rename(&tmp, &path).map_err(DataError::from));
        if let Err(e) = written {
            // best-effort cleanup
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        info!(symbol = %symbol, inserted = bars.len(), total = rows.len(), "stored price data");
        Ok(rows.len())
    }

    /// First and last stored dates for `symbol`.
    pub fn available_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, DataError> {
        let bars = self.load_all(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        })
    }

    /// Stored rows with `start <= date <= end`, sorted by date.
    pub fn query(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        Ok(self
            .load_all(symbol)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect())
    }

    /// Symbols that have a file in the store, sorted.
    pub fn symbols(&self) -> Result<Vec<String>, DataError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut symbols: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

fn write_rows<'a>(
    path: &Path,
    rows: impl Iterator<Item = &'a PriceBar>,
) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;
    for bar in rows {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
