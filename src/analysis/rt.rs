//! Reproduction-Number Estimator
//!
//! `Rt(d) = sum(cases[d-w+1 ..= d]) / sum(cases[d-2w+1 ..= d-w])`
//!
//! The ratio of the case total over the trailing window to the total over
//! the window just before it. With `w` close to the serial interval this
//! approximates the multiplicative growth over one generation.
//!
//! The first `2w - 1` dates are undefined. A zero preceding window is
//! undefined too: no Infinity or NaN ever leaves this module.

use super::error::{AnalysisError, AnalysisResult};
use super::window::rolling_sum_values;
use crate::data::{DailySeries, RegionalTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default window length in days
pub const DEFAULT_WINDOW_DAYS: usize = 14;

/// Ratio of the current window sum to the previous one.
///
/// `None` when the previous window is zero or the result is not finite.
pub fn rt_ratio(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let ratio = current / previous;
    ratio.is_finite().then_some(ratio)
}

/// Estimate Rt for every date of a daily case series
pub fn estimate_rt(cases: &DailySeries, window: usize) -> AnalysisResult<DailySeries> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }

    let sums = rolling_sum_values(cases.values(), window);
    let rt = (0..sums.len())
        .map(|i| {
            if i < window {
                return None;
            }
            match (sums[i], sums[i - window]) {
                (Some(current), Some(previous)) => rt_ratio(current, previous),
                _ => None,
            }
        })
        .collect();

    Ok(cases.with_values(rt))
}

/// Last defined Rt value and its date
pub fn latest_rt(rt: &DailySeries) -> Option<(NaiveDate, f64)> {
    rt.last_defined()
}

/// Rt series per department, on the regional table's date index
#[derive(Debug, Clone, Default, Serialize)]
pub struct RtTable {
    window: usize,
    series: BTreeMap<String, DailySeries>,
}

impl RtTable {
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn get(&self, code: &str) -> Option<&DailySeries> {
        self.series.get(code)
    }

    /// Rt on the last day of the index
    pub fn last_value(&self, code: &str) -> Option<f64> {
        self.series.get(code).and_then(DailySeries::last)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DailySeries)> {
        self.series.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Estimate Rt for every department of a regional table
pub fn estimate_rt_table(table: &RegionalTable, window: usize) -> AnalysisResult<RtTable> {
    let series = table
        .positive_series()
        .map(|(code, cases)| Ok((code.to_string(), estimate_rt(cases, window)?)))
        .collect::<AnalysisResult<BTreeMap<_, _>>>()?;

    Ok(RtTable { window, series })
}
