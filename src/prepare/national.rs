//! National plot data
//!
//! Joins the national case series with the model forecast, split at the last
//! date with ground truth into past actual, past re-estimated and future
//! predicted segments.

use super::{PrepareError, PrepareResult};
use crate::data::{DailySeries, NationalFeatures};
use crate::forecast::Forecast;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// One chart point: daily count and running total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CasePoint {
    pub date: NaiveDate,
    pub daily: Option<f64>,
    pub total: Option<f64>,
}

/// National case chart data
#[derive(Debug, Clone, Serialize)]
pub struct NationalPlotData {
    /// Observed days
    pub actual: Vec<CasePoint>,
    /// Model estimates for observed days
    pub re_estimated: Vec<CasePoint>,
    /// Model predictions after the last observed day
    pub predicted: Vec<CasePoint>,
    /// Last date with ground truth
    pub last_truth_date: NaiveDate,
    /// Date the model was last trained
    pub model_date: NaiveDate,
}

impl NationalPlotData {
    /// Last predicted date, or the last observed one without predictions
    pub fn last_predicted_date(&self) -> NaiveDate {
        self.predicted
            .last()
            .map(|p| p.date)
            .unwrap_or(self.last_truth_date)
    }
}

/// Running totals of observed daily cases; undefined days add nothing
fn running_totals(cases: &DailySeries) -> Vec<CasePoint> {
    let mut total = 0.0;
    cases
        .iter()
        .map(|(date, daily)| {
            total += daily.unwrap_or(0.0);
            CasePoint {
                date,
                daily,
                total: Some(total),
            }
        })
        .collect()
}

/// Build the national chart segments.
///
/// - re-estimated totals: the observed total of the previous day plus the
///   estimated daily count
/// - predicted totals: continue from the last observed total
pub fn prepare_national(
    features: &NationalFeatures,
    forecast: &Forecast,
) -> PrepareResult<NationalPlotData> {
    let cases = features
        .positive_series()
        .ok_or_else(|| PrepareError::InsufficientData("empty national features".to_string()))?;
    let last_truth_date = cases
        .end()
        .ok_or_else(|| PrepareError::InsufficientData("empty national features".to_string()))?;

    let actual = running_totals(&cases);
    let last_total = actual.last().and_then(|p| p.total).unwrap_or(0.0);
    let total_on = |date: NaiveDate| -> Option<f64> {
        cases.index_of(date).and_then(|i| actual[i].total)
    };

    let mut re_estimated = Vec::new();
    let mut predicted = Vec::new();
    let mut future_total = last_total;

    for (date, daily) in forecast.predicted.iter() {
        if date <= last_truth_date {
            let previous = total_on(date - Duration::days(1)).unwrap_or(0.0);
            re_estimated.push(CasePoint {
                date,
                daily,
                total: daily.map(|d| previous + d),
            });
        } else {
            future_total += daily.unwrap_or(0.0);
            predicted.push(CasePoint {
                date,
                daily,
                total: Some(future_total),
            });
        }
    }

    Ok(NationalPlotData {
        actual,
        re_estimated,
        predicted,
        last_truth_date,
        model_date: forecast.trained_until,
    })
}

/// Positivity chart point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositivityPoint {
    pub date: NaiveDate,
    /// 100 * positive / tested, undefined when nothing was tested
    pub rate: Option<f64>,
    /// Mean age of positive cases
    pub age_positive: Option<f64>,
}

/// National positivity rate and mean age of positives
pub fn prepare_positivity(features: &NationalFeatures) -> Vec<PositivityPoint> {
    let (Some(positive), Some(tested), Some(age)) = (
        features.positive_series(),
        features.tested_series(),
        features.age_positive_series(),
    ) else {
        return Vec::new();
    };

    positive
        .iter()
        .zip(tested.values())
        .zip(age.values())
        .map(|(((date, pos), test), age)| PositivityPoint {
            date,
            rate: match (pos, test) {
                (Some(p), Some(t)) if *t > 0.0 => Some(100.0 * p / t),
                _ => None,
            },
            age_positive: *age,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureRow;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 9, day).unwrap()
    }

    fn features(values: &[f64]) -> NationalFeatures {
        NationalFeatures::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| FeatureRow {
                    positive: Some(*v),
                    tested: Some(v * 10.0),
                    age_positive: Some(40.0),
                    ..FeatureRow::new(date(1 + i as u32))
                })
                .collect(),
        )
    }

    fn forecast(start_day: u32, values: Vec<f64>) -> Forecast {
        Forecast {
            trained_until: date(2),
            predicted: DailySeries::from_values(date(start_day), values),
        }
    }

    #[test]
    fn test_segments_split_at_last_truth_date() {
        let features = features(&[10.0, 20.0, 30.0]);
        let forecast = forecast(2, vec![18.0, 33.0, 40.0, 45.0]);

        let plot = prepare_national(&features, &forecast).unwrap();

        assert_eq!(plot.last_truth_date, date(3));
        assert_eq!(plot.model_date, date(2));
        assert_eq!(plot.actual.len(), 3);
        assert!(plot.re_estimated.iter().all(|p| p.date <= date(3)));
        assert!(plot.predicted.iter().all(|p| p.date > date(3)));
        assert_eq!(plot.re_estimated.len() + plot.predicted.len(), 4);
        assert_eq!(plot.last_predicted_date(), date(5));
    }

    #[test]
    fn test_totals() {
        let features = features(&[10.0, 20.0, 30.0]);
        let forecast = forecast(2, vec![18.0, 33.0, 40.0, 45.0]);

        let plot = prepare_national(&features, &forecast).unwrap();

        let actual_totals: Vec<_> = plot.actual.iter().map(|p| p.total).collect();
        assert_eq!(actual_totals, vec![Some(10.0), Some(30.0), Some(60.0)]);

        // Day 2: observed total of day 1 (10) + estimate 18
        assert_eq!(plot.re_estimated[0].total, Some(28.0));
        // Day 3: observed total of day 2 (30) + estimate 33
        assert_eq!(plot.re_estimated[1].total, Some(63.0));

        let future_totals: Vec<_> = plot.predicted.iter().map(|p| p.total).collect();
        assert_eq!(future_totals, vec![Some(100.0), Some(145.0)]);
    }

    #[test]
    fn test_forecast_entirely_in_future() {
        let features = features(&[10.0, 20.0]);
        let forecast = forecast(3, vec![25.0]);

        let plot = prepare_national(&features, &forecast).unwrap();

        assert!(plot.re_estimated.is_empty());
        assert_eq!(plot.predicted[0].total, Some(55.0));
    }

    #[test]
    fn test_empty_features_rejected() {
        let err = prepare_national(&NationalFeatures::default(), &forecast(1, vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, PrepareError::InsufficientData(_)));
    }

    #[test]
    fn test_positivity_rate() {
        let mut rows = features(&[10.0, 20.0]).rows().to_vec();
        rows[1].tested = Some(0.0);
        let points = prepare_positivity(&NationalFeatures::new(rows));

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].rate, Some(10.0));
        assert_eq!(points[1].rate, None);
        assert_eq!(points[0].age_positive, Some(40.0));
    }
}
