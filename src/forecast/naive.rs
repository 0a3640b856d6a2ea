//! Trailing-mean baseline forecaster
//!
//! Each day is predicted as the mean of the `MEAN_DAYS` days before it.
//! Future days repeat the mean of the last `MEAN_DAYS` observed days.

use super::{require_history, Forecast, ForecastError, Forecaster, FUTURE_TARGET, PAST_HISTORY};
use crate::data::{DailySeries, NationalFeatures};

const MEAN_DAYS: usize = 7;

/// Baseline used when no model output is configured
#[derive(Debug, Clone, Default)]
pub struct NaiveForecaster;

impl NaiveForecaster {
    pub fn new() -> Self {
        Self
    }
}

fn mean_defined(values: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

impl Forecaster for NaiveForecaster {
    fn name(&self) -> &str {
        "naive"
    }

    fn forecast(&self, history: &NationalFeatures) -> Result<Forecast, ForecastError> {
        require_history(history)?;
        let cases = history
            .positive_series()
            .ok_or_else(|| ForecastError::Invalid("empty history".to_string()))?;
        let values = cases.values();

        let mut predicted: Vec<Option<f64>> = (PAST_HISTORY..values.len())
            .map(|i| mean_defined(&values[i - MEAN_DAYS..i]))
            .collect();

        let future = mean_defined(&values[values.len() - MEAN_DAYS..]);
        predicted.extend(std::iter::repeat(future).take(FUTURE_TARGET));

        let trained_until = cases
            .end()
            .ok_or_else(|| ForecastError::Invalid("empty history".to_string()))?;

        Ok(Forecast {
            trained_until,
            predicted: DailySeries::new(cases.date_at(PAST_HISTORY), predicted),
        })
    }
}
