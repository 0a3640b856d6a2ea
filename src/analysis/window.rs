//! Rolling Window Aggregator
//!
//! Output at date `d` is the sum of the inputs over `[d - w + 1, d]`.
//! The first `w - 1` positions have no full window and are undefined, as is
//! any window covering an undefined input.

use super::error::{AnalysisError, AnalysisResult};
use crate::data::DailySeries;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Sum a full window, `None` if any value is undefined
pub fn window_sum(values: &[Option<f64>]) -> Option<f64> {
    values.iter().copied().sum()
}

/// Trailing-window sums over raw values
pub fn rolling_sum_values(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                window_sum(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Trailing-window sums over a daily series, aligned to its index
pub fn rolling_sum(series: &DailySeries, window: usize) -> AnalysisResult<DailySeries> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }
    Ok(series.with_values(rolling_sum_values(series.values(), window)))
}

/// Inclusive date span of a trailing window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Window span ending at each date of the series.
///
/// Leading spans start before the series start; they describe the window a
/// full computation would need, not the data available.
pub fn date_ranges(series: &DailySeries, window: usize) -> AnalysisResult<Vec<DateRange>> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }
    let span = Duration::days(window as i64 - 1);
    Ok(series
        .dates()
        .map(|end| DateRange {
            start: end - span,
            end,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 9, 1).unwrap()
    }

    #[test]
    fn test_rolling_sum_matches_arithmetic_sum() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 37) % 11) as f64).collect();
        let series = DailySeries::from_values(start(), values.clone());

        for window in [1, 3, 7, 14] {
            let sums = rolling_sum(&series, window).unwrap();
            for i in (window - 1)..values.len() {
                let expected: f64 = values[i + 1 - window..=i].iter().sum();
                assert_eq!(sums.values()[i], Some(expected), "window {} index {}", window, i);
            }
        }
    }

    #[test]
    fn test_rolling_sum_leading_positions_undefined() {
        let series = DailySeries::from_values(start(), vec![1.0; 10]);
        let sums = rolling_sum(&series, 4).unwrap();

        assert_eq!(&sums.values()[..3], &[None, None, None]);
        assert_eq!(sums.values()[3], Some(4.0));
        assert_eq!(sums.start(), series.start());
        assert_eq!(sums.len(), series.len());
    }

    #[test]
    fn test_rolling_sum_undefined_input_poisons_window() {
        let series = DailySeries::new(
            start(),
            vec![Some(1.0), Some(1.0), None, Some(1.0), Some(1.0), Some(1.0)],
        );
        let sums = rolling_sum(&series, 3).unwrap();

        assert_eq!(
            sums.values(),
            &[None, None, None, None, None, Some(3.0)]
        );
    }

    #[test]
    fn test_rolling_sum_shorter_than_window() {
        let series = DailySeries::from_values(start(), vec![5.0, 5.0]);
        let sums = rolling_sum(&series, 14).unwrap();
        assert!(sums.values().iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_sum_rejects_zero_window() {
        let series = DailySeries::from_values(start(), vec![1.0]);
        assert_eq!(rolling_sum(&series, 0), Err(AnalysisError::InvalidWindow(0)));
    }

    #[test]
    fn test_date_ranges() {
        let series = DailySeries::from_values(start(), vec![0.0; 3]);
        let ranges = date_ranges(&series, 14).unwrap();

        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].end, NaiveDate::from_ymd_opt(2020, 9, 3).unwrap());
        assert_eq!(ranges[2].start, NaiveDate::from_ymd_opt(2020, 8, 21).unwrap());
    }
}
