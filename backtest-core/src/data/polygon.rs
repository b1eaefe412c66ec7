//! Polygon.io daily aggregates provider.
//!
//! Endpoint: `/v2/aggs/ticker/{symbol}/range/1/day/{start}/{end}`, split
//! adjusted, ascending. Requires an API key.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::provider::{DataError, DataProvider, FetchResult};
use crate::domain::PriceBar;

const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Aggregates endpoint response.
#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    ticker: Option<String>,
    results: Option<Vec<AggregateBar>>,
}

/// One daily aggregate. `t` is the window start in epoch milliseconds;
/// `v` can be fractional for some instruments.
#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

/// Parse an aggregates response body into bars sorted by date.
///
/// The symbol on each bar comes from the response's `ticker` field.
/// A missing ticker or an empty result set means the symbol is unknown.
pub fn parse_aggregates(symbol: &str, body: &str) -> Result<Vec<PriceBar>, DataError> {
    let resp: AggregatesResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
    })?;

    let ticker = resp
        .ticker
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;

    let results = resp.results.unwrap_or_default();
    if results.is_empty() {
        return Err(DataError::SymbolNotFound { symbol: ticker });
    }

    let mut bars = Vec::with_capacity(results.len());
    for agg in results {
        let date = DateTime::from_timestamp_millis(agg.t)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {}", agg.t))
            })?;
        bars.push(PriceBar {
            symbol: ticker.clone(),
            date,
            open: agg.o,
            high: agg.h,
            low: agg.l,
            close: agg.c,
            volume: agg.v.max(0.0).round() as u64,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

/// Polygon.io data provider (blocking HTTP).
pub struct PolygonProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl PolygonProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Point the provider at a different host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn aggregates_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let symbol = symbol.trim().to_ascii_uppercase();
        format!(
            "{}/v2/aggs/ticker/{symbol}/range/1/day/{start}/{end}\
             ?adjusted=true&sort=asc&limit=50000&apiKey={}",
            self.base_url, self.api_key
        )
    }

    /// Execute the request with retry on rate limiting, 5xx, and connect errors.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let url = self.aggregates_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(symbol, attempt, ?delay, "retrying price data request");
                std::thread::sleep(delay);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(DataError::AuthenticationRequired(format!(
                    "Polygon rejected the API key (HTTP {status})"
                )));
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if status.is_server_error() {
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }
            if !status.is_success() {
                return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
            }

            let body = resp
                .text()
                .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
            return parse_aggregates(symbol, &body);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for PolygonProvider {
    fn name(&self) -> &str {
        "polygon"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        info!(symbol, %start, %end, "retrieving price data");
        let bars = self.fetch_with_retry(symbol, start, end)?;
        info!(symbol, records = bars.len(), "price data fetched");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
        })
    }
}
