//! Precomputed model output
//!
//! The model runs outside this process and writes its predictions as
//! `date,pos` rows. The file is re-read on every forecast so a refresh picks
//! up new model output.

use super::{require_history, Forecast, ForecastError, Forecaster};
use crate::data::loader::parse_date;
use crate::data::{DailySeries, NationalFeatures};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Reads predicted daily cases from a CSV file
#[derive(Debug, Clone)]
pub struct CsvForecaster {
    path: PathBuf,
    trained_until: Option<NaiveDate>,
}

impl CsvForecaster {
    /// `trained_until` defaults to the last ground-truth date when unknown
    pub fn new(path: impl Into<PathBuf>, trained_until: Option<NaiveDate>) -> Self {
        Self {
            path: path.into(),
            trained_until,
        }
    }

    /// Parse model output rows
    pub fn parse(content: &str) -> Result<DailySeries, ForecastError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ForecastError::Invalid(format!("missing column '{}'", name)))
        };
        let date_col = position("date")?;
        let pos_col = position("pos")?;

        let mut points = Vec::new();
        for (line_num, result) in reader.records().enumerate() {
            let record = result?;
            let line = line_num + 2;

            let raw_date = record.get(date_col).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| {
                ForecastError::Invalid(format!("line {}: invalid date '{}'", line, raw_date))
            })?;
            let raw_value = record.get(pos_col).unwrap_or("").trim();
            let value: f64 = raw_value.parse().map_err(|_| {
                ForecastError::Invalid(format!("line {}: invalid value '{}'", line, raw_value))
            })?;
            points.push((date, value));
        }

        DailySeries::from_points(points)
            .ok_or_else(|| ForecastError::Invalid("no predictions".to_string()))
    }
}

impl Forecaster for CsvForecaster {
    fn name(&self) -> &str {
        "csv"
    }

    fn forecast(&self, history: &NationalFeatures) -> Result<Forecast, ForecastError> {
        require_history(history)?;

        let content = std::fs::read_to_string(&self.path).map_err(|e| ForecastError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        })?;
        let predicted = Self::parse(&content)?;

        let trained_until = match self.trained_until.or_else(|| history.last_date()) {
            Some(date) => date,
            None => return Err(ForecastError::Invalid("empty history".to_string())),
        };

        tracing::debug!(
            path = ?self.path,
            days = predicted.len(),
            %trained_until,
            "Loaded model predictions"
        );

        Ok(Forecast {
            trained_until,
            predicted,
        })
    }
}
