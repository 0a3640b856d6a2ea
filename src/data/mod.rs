//! Input Data
//!
//! Loading and shaping of the dashboard inputs:
//!
//! - **types**: Daily series, regional table, national features, name lookup
//! - **loader**: CSV and GeoJSON parsers
//! - **source**: Refresh boundary (`DataSource`) with file and HTTP backends
//! - **error**: Error types

pub mod error;
pub mod loader;
pub mod source;
pub mod types;

pub use error::{DataError, DataResult};
pub use source::{DataPaths, DataSource, FileDataSource, HttpDataSource};
pub use types::{
    DailySeries, FeatureRow, NationalFeatures, RawData, RegionNames, RegionalRecord, RegionalTable,
};
