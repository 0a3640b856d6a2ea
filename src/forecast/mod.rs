//! Forecast Boundary
//!
//! The case forecast comes from a pre-trained model treated as an opaque
//! function. Given the national feature history it returns predicted daily
//! cases for past dates (re-estimation) and for the next `FUTURE_TARGET`
//! days, plus the date the model was last trained.
//!
//! - `CsvForecaster`: reads precomputed model output from disk
//! - `NaiveForecaster`: trailing-mean baseline, no model required

mod csv_output;
mod naive;

pub use csv_output::CsvForecaster;
pub use naive::NaiveForecaster;

use crate::data::{DailySeries, NationalFeatures};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Days of history the model consumes
pub const PAST_HISTORY: usize = 14;

/// Days the model predicts ahead
pub const FUTURE_TARGET: usize = 7;

/// Model output
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// Date the model was last trained
    pub trained_until: NaiveDate,
    /// Predicted daily cases; may start inside the ground-truth period
    pub predicted: DailySeries,
}

/// Common trait for forecast providers
pub trait Forecaster: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Produce a forecast from the national history
    fn forecast(&self, history: &NationalFeatures) -> Result<Forecast, ForecastError>;
}

/// Errors raised by forecast providers
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Insufficient history: need {needed} days, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("Failed to read forecast file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Invalid forecast output: {0}")]
    Invalid(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn require_history(history: &NationalFeatures) -> Result<(), ForecastError> {
    if history.len() < PAST_HISTORY {
        return Err(ForecastError::InsufficientHistory {
            needed: PAST_HISTORY,
            available: history.len(),
        });
    }
    Ok(())
}
