//! Market data: provider trait, Polygon client, on-disk bar store.

pub mod polygon;
pub mod provider;
pub mod store;

pub use polygon::{parse_aggregates, PolygonProvider};
pub use provider::{DataError, DataProvider, FetchResult};
pub use store::CsvBarStore;
