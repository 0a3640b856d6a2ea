//! Core data types for the dashboard
//!
//! - `DailySeries`: one value per calendar day, gap-free by construction
//! - `RegionalTable`: per-department positive/tested series on a shared index
//! - `NationalFeatures`: national feature rows fed to the forecast model
//! - `RegionNames`: department code <-> display name lookup
//! - `RawData`: everything a data source hands over on load

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An ordered daily series starting at `start`, one entry per calendar day.
///
/// Values are `None` where the day is undefined (no data, or no full
/// window for derived series). The index can never contain gaps: missing
/// days are represented by `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<Option<f64>>,
}

impl DailySeries {
    /// Create a series from raw optional values
    pub fn new(start: NaiveDate, values: Vec<Option<f64>>) -> Self {
        Self { start, values }
    }

    /// Create a fully defined series
    pub fn from_values(start: NaiveDate, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            start,
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Build a series from unordered (date, value) points.
    ///
    /// Points sharing a date are summed. Calendar days with no point become
    /// `None`. Returns `None` when there are no points at all.
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Option<Self> {
        let by_date = collect_by_date(points);
        let start = *by_date.keys().next()?;
        let end = *by_date.keys().next_back()?;
        let len = (end - start).num_days() as usize + 1;
        Some(Self::fill(start, len, &by_date))
    }

    /// Build a series over a fixed index `[start, start + len)`.
    ///
    /// Points outside the index are ignored.
    pub fn from_points_between(
        start: NaiveDate,
        len: usize,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self::fill(start, len, &collect_by_date(points))
    }

    fn fill(start: NaiveDate, len: usize, by_date: &BTreeMap<NaiveDate, f64>) -> Self {
        let values = (0..len)
            .map(|i| by_date.get(&(start + Duration::days(i as i64))).copied())
            .collect();
        Self { start, values }
    }

    /// Same index, new values. Used by derived computations.
    pub fn with_values(&self, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(values.len(), self.values.len());
        Self {
            start: self.start,
            values,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the index, `None` for an empty series
    pub fn end(&self) -> Option<NaiveDate> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.date_at(self.values.len() - 1))
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Date at a given position in the index
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// Position of a date in the index
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        if offset < 0 || offset as usize >= self.values.len() {
            None
        } else {
            Some(offset as usize)
        }
    }

    /// Value at a date (flattened: out of range and undefined are both `None`)
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).and_then(|i| self.values[i])
    }

    /// Value on the last day of the index
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    /// Most recent defined value and its date
    pub fn last_defined(&self) -> Option<(NaiveDate, f64)> {
        self.values
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, v)| v.map(|v| (self.date_at(i), v)))
    }

    /// Iterate over (date, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.date_at(i), *v))
    }

    /// All dates of the index
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.values.len()).map(move |i| self.date_at(i))
    }

    /// Sum of defined values over the last `days` entries
    pub fn tail_sum(&self, days: usize) -> f64 {
        let from = self.values.len().saturating_sub(days);
        self.values[from..].iter().flatten().sum()
    }
}

fn collect_by_date(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> BTreeMap<NaiveDate, f64> {
    let mut by_date = BTreeMap::new();
    for (date, value) in points {
        *by_date.entry(date).or_insert(0.0) += value;
    }
    by_date
}

/// One row of the regional input: counts for a department on a day
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalRecord {
    pub code: String,
    pub date: NaiveDate,
    pub positive: f64,
    pub tested: f64,
}

/// Positive and tested daily counts per department, on one shared date index
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionalTable {
    positive: BTreeMap<String, DailySeries>,
    tested: BTreeMap<String, DailySeries>,
}

impl RegionalTable {
    /// Pivot records into per-department series.
    ///
    /// The shared index spans the earliest to the latest record date over all
    /// departments; days a department did not report are undefined.
    pub fn from_records(records: &[RegionalRecord]) -> Self {
        let (Some(start), Some(end)) = (
            records.iter().map(|r| r.date).min(),
            records.iter().map(|r| r.date).max(),
        ) else {
            return Self::default();
        };
        let len = (end - start).num_days() as usize + 1;

        let mut positive_points: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        let mut tested_points: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for record in records {
            positive_points
                .entry(record.code.as_str())
                .or_default()
                .push((record.date, record.positive));
            tested_points
                .entry(record.code.as_str())
                .or_default()
                .push((record.date, record.tested));
        }

        let positive = positive_points
            .into_iter()
            .map(|(code, points)| {
                (code.to_string(), DailySeries::from_points_between(start, len, points))
            })
            .collect();
        let tested = tested_points
            .into_iter()
            .map(|(code, points)| {
                (code.to_string(), DailySeries::from_points_between(start, len, points))
            })
            .collect();

        Self { positive, tested }
    }

    /// Department codes, sorted
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.positive.keys().map(String::as_str)
    }

    pub fn region_count(&self) -> usize {
        self.positive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty()
    }

    pub fn positive(&self, code: &str) -> Option<&DailySeries> {
        self.positive.get(code)
    }

    pub fn tested(&self, code: &str) -> Option<&DailySeries> {
        self.tested.get(code)
    }

    pub fn positive_series(&self) -> impl Iterator<Item = (&str, &DailySeries)> {
        self.positive.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First date of the shared index
    pub fn start(&self) -> Option<NaiveDate> {
        self.positive.values().next().map(DailySeries::start)
    }

    /// Last date of the shared index
    pub fn end(&self) -> Option<NaiveDate> {
        self.positive.values().next().and_then(DailySeries::end)
    }

    /// Number of days in the shared index
    pub fn days(&self) -> usize {
        self.positive.values().next().map(DailySeries::len).unwrap_or(0)
    }

    /// Sum every department per day into national positive/tested series
    pub fn national_totals(&self) -> Option<(DailySeries, DailySeries)> {
        let start = self.start()?;
        let days = self.days();
        let sum = |map: &BTreeMap<String, DailySeries>| {
            let values = (0..days)
                .map(|i| {
                    let defined: Vec<f64> = map.values().filter_map(|s| s.values()[i]).collect();
                    if defined.is_empty() {
                        None
                    } else {
                        Some(defined.iter().sum())
                    }
                })
                .collect();
            DailySeries::new(start, values)
        };
        Some((sum(&self.positive), sum(&self.tested)))
    }
}

/// National daily features used by the forecast model and national charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// Confirmed (positive) cases
    pub positive: Option<f64>,
    /// Tested cases
    pub tested: Option<f64>,
    /// Mean age of positive cases
    pub age_positive: Option<f64>,
    /// Mean age of tested cases
    pub age_tested: Option<f64>,
    /// Other numeric covariates (temperatures, humidities, day of week)
    pub covariates: BTreeMap<String, f64>,
}

impl FeatureRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            positive: None,
            tested: None,
            age_positive: None,
            age_tested: None,
            covariates: BTreeMap::new(),
        }
    }
}

/// National feature table, sorted by date with no duplicate dates
#[derive(Debug, Clone, Default, Serialize)]
pub struct NationalFeatures {
    rows: Vec<FeatureRow>,
}

impl NationalFeatures {
    /// Sort rows by date; later duplicates replace earlier ones
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        let by_date: BTreeMap<NaiveDate, FeatureRow> =
            rows.into_iter().map(|r| (r.date, r)).collect();
        Self {
            rows: by_date.into_values().collect(),
        }
    }

    /// Derive positive/tested features by summing the regional table.
    ///
    /// Used when no national feature file is available.
    pub fn from_regional(table: &RegionalTable) -> Self {
        let Some((positive, tested)) = table.national_totals() else {
            return Self::default();
        };
        let rows = positive
            .iter()
            .zip(tested.values())
            .map(|((date, pos), test)| FeatureRow {
                positive: pos,
                tested: *test,
                ..FeatureRow::new(date)
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Trailing window of at most `days` rows
    pub fn tail(&self, days: usize) -> &[FeatureRow] {
        &self.rows[self.rows.len().saturating_sub(days)..]
    }

    /// Gap-free positive series
    pub fn positive_series(&self) -> Option<DailySeries> {
        self.series(|r| r.positive)
    }

    /// Gap-free tested series
    pub fn tested_series(&self) -> Option<DailySeries> {
        self.series(|r| r.tested)
    }

    /// Gap-free mean-age-of-positives series
    pub fn age_positive_series(&self) -> Option<DailySeries> {
        self.series(|r| r.age_positive)
    }

    fn series(&self, field: impl Fn(&FeatureRow) -> Option<f64>) -> Option<DailySeries> {
        let start = self.first_date()?;
        let end = self.last_date()?;
        let len = (end - start).num_days() as usize + 1;
        let values: HashMap<NaiveDate, Option<f64>> =
            self.rows.iter().map(|r| (r.date, field(r))).collect();
        let series = (0..len)
            .map(|i| {
                values
                    .get(&(start + Duration::days(i as i64)))
                    .copied()
                    .flatten()
            })
            .collect();
        Some(DailySeries::new(start, series))
    }
}

/// Department code <-> display name lookup
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionNames {
    by_code: BTreeMap<String, String>,
    #[serde(skip)]
    by_name: HashMap<String, String>,
}

impl RegionNames {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut names = Self::default();
        for (code, name) in pairs {
            names.insert(code, name);
        }
        names
    }

    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) {
        let code = code.into();
        let name = name.into();
        self.by_name.insert(name.clone(), code.clone());
        self.by_code.insert(code, name);
    }

    /// Display name for a code
    pub fn name(&self, code: &str) -> Option<&str> {
        self.by_code.get(code).map(String::as_str)
    }

    /// Code for a display name
    pub fn code(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Everything loaded from a data source on refresh
#[derive(Debug, Clone)]
pub struct RawData {
    pub regional: RegionalTable,
    pub national: NationalFeatures,
    /// GeoJSON FeatureCollection of departments, keyed by `properties.nom`
    pub geography: serde_json::Value,
    pub names: RegionNames,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_from_points_fills_gaps() {
        let series = DailySeries::from_points(vec![
            (date("2020-06-03"), 3.0),
            (date("2020-06-01"), 1.0),
        ])
        .unwrap();

        assert_eq!(series.start(), date("2020-06-01"));
        assert_eq!(series.values(), &[Some(1.0), None, Some(3.0)]);
        assert_eq!(series.end(), Some(date("2020-06-03")));
    }

    #[test]
    fn test_from_points_sums_duplicates() {
        let series = DailySeries::from_points(vec![
            (date("2020-06-01"), 1.0),
            (date("2020-06-01"), 2.5),
        ])
        .unwrap();
        assert_eq!(series.values(), &[Some(3.5)]);
    }

    #[test]
    fn test_from_points_empty() {
        assert!(DailySeries::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_last_defined_skips_trailing_gap() {
        let series = DailySeries::new(date("2020-06-01"), vec![Some(1.0), Some(2.0), None]);
        assert_eq!(series.last(), None);
        assert_eq!(series.last_defined(), Some((date("2020-06-02"), 2.0)));
    }

    #[test]
    fn test_index_of_out_of_range() {
        let series = DailySeries::from_values(date("2020-06-01"), vec![1.0, 2.0]);
        assert_eq!(series.index_of(date("2020-05-31")), None);
        assert_eq!(series.index_of(date("2020-06-02")), Some(1));
        assert_eq!(series.index_of(date("2020-06-03")), None);
    }

    #[test]
    fn test_regional_table_shares_index() {
        let records = vec![
            RegionalRecord {
                code: "75".into(),
                date: date("2020-06-01"),
                positive: 10.0,
                tested: 100.0,
            },
            RegionalRecord {
                code: "69".into(),
                date: date("2020-06-03"),
                positive: 5.0,
                tested: 50.0,
            },
        ];

        let table = RegionalTable::from_records(&records);

        assert_eq!(table.region_count(), 2);
        assert_eq!(table.days(), 3);
        assert_eq!(table.positive("69").unwrap().values(), &[None, None, Some(5.0)]);
        assert_eq!(table.tested("75").unwrap().values(), &[Some(100.0), None, None]);
        assert_eq!(table.codes().collect::<Vec<_>>(), vec!["69", "75"]);
    }

    #[test]
    fn test_national_from_regional() {
        let records = vec![
            RegionalRecord {
                code: "75".into(),
                date: date("2020-06-01"),
                positive: 10.0,
                tested: 100.0,
            },
            RegionalRecord {
                code: "69".into(),
                date: date("2020-06-01"),
                positive: 5.0,
                tested: 40.0,
            },
        ];
        let national = NationalFeatures::from_regional(&RegionalTable::from_records(&records));

        assert_eq!(national.len(), 1);
        assert_eq!(national.rows()[0].positive, Some(15.0));
        assert_eq!(national.rows()[0].tested, Some(140.0));
    }

    #[test]
    fn test_region_names_lookup_both_ways() {
        let names = RegionNames::new(vec![("75".to_string(), "Paris".to_string())]);
        assert_eq!(names.name("75"), Some("Paris"));
        assert_eq!(names.code("Paris"), Some("75"));
        assert_eq!(names.name("975"), None);
    }
}
