//! Plot-Data Preparation
//!
//! Turns raw inputs and the model forecast into an immutable `Dataset`
//! holding every table the views need:
//!
//! - **national**: national series joined with the forecast, positivity rate
//! - **snapshot**: per-department totals over the last complete window
//!
//! ```text
//! RawData + Forecaster
//!     → Rt table (per department)
//!     → snapshot rows
//!     → national segments + positivity
//!     → Dataset
//! ```

pub mod national;
pub mod snapshot;

pub use national::{prepare_national, prepare_positivity, CasePoint, NationalPlotData, PositivityPoint};
pub use snapshot::{
    build_snapshot, is_excluded, Snapshot, SnapshotRow, EXCLUDED_REGION_CODES, SNAPSHOT_WINDOW_DAYS,
};

use crate::analysis::{estimate_rt_table, AnalysisError, RtTable, DEFAULT_WINDOW_DAYS};
use crate::data::{NationalFeatures, RawData, RegionNames, RegionalTable};
use crate::forecast::{ForecastError, Forecaster};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Errors raised while preparing a dataset
#[derive(Debug, Error)]
pub enum PrepareError {
    /// A department code has no display name and is not a known exclusion
    #[error("Unknown region code: {0}")]
    UnknownRegion(String),

    /// Not enough days for the requested computation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),
}

/// Result type alias for preparation
pub type PrepareResult<T> = Result<T, PrepareError>;

/// Everything the views render from, built once per refresh
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Last date of the regional data
    pub data_date: NaiveDate,
    pub regional: RegionalTable,
    pub rt: RtTable,
    pub snapshot: Snapshot,
    pub national: NationalFeatures,
    pub national_plot: NationalPlotData,
    pub positivity: Vec<PositivityPoint>,
    pub names: RegionNames,
    /// Department boundaries keyed by `properties.nom`
    pub geography: serde_json::Value,
    pub prepared_at: DateTime<Utc>,
}

impl Dataset {
    /// Run every preparation step over freshly loaded inputs
    pub fn build(raw: RawData, forecaster: &dyn Forecaster) -> PrepareResult<Self> {
        let start = std::time::Instant::now();

        let data_date = raw
            .regional
            .end()
            .ok_or_else(|| PrepareError::InsufficientData("empty regional table".to_string()))?;

        let rt = estimate_rt_table(&raw.regional, DEFAULT_WINDOW_DAYS)?;
        let snapshot = build_snapshot(&raw.regional, &rt, &raw.names, SNAPSHOT_WINDOW_DAYS)?;

        let forecast = forecaster.forecast(&raw.national)?;
        let national_plot = prepare_national(&raw.national, &forecast)?;
        let positivity = prepare_positivity(&raw.national);

        tracing::info!(
            %data_date,
            regions = snapshot.len(),
            forecaster = forecaster.name(),
            model_date = %forecast.trained_until,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dataset prepared"
        );

        Ok(Self {
            data_date,
            regional: raw.regional,
            rt,
            snapshot,
            national: raw.national,
            national_plot,
            positivity,
            names: raw.names,
            geography: raw.geography,
            prepared_at: Utc::now(),
        })
    }

    /// Department codes shown in the multi-panel Rt view
    pub fn panel_codes(&self) -> impl Iterator<Item = &str> {
        self.rt.iter().map(|(code, _)| code).filter(|code| !is_excluded(code))
    }
}
