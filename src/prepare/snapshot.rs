//! Snapshot rows
//!
//! Per-department totals over the most recent complete window, driving the
//! map layers and the detail panels.

use super::{PrepareError, PrepareResult};
use crate::analysis::{window_sum, RtTable};
use crate::data::{RegionNames, RegionalTable};
use chrono::NaiveDate;
use serde::Serialize;

/// Length of the snapshot window in days
pub const SNAPSHOT_WINDOW_DAYS: usize = 14;

/// Overseas department codes missing from the name lookup.
///
/// Skipped by the snapshot and the multi-panel Rt view. Any other unmapped
/// code is an error.
pub const EXCLUDED_REGION_CODES: [&str; 3] = ["975", "977", "978"];

pub fn is_excluded(code: &str) -> bool {
    EXCLUDED_REGION_CODES.contains(&code)
}

/// Aggregated totals for one department
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    /// Department code
    pub code: String,
    /// Display name
    pub name: String,
    /// Positive cases over the window
    pub positive: f64,
    /// Tested cases over the window
    pub tested: f64,
    /// Positive cases over the window before
    pub positive_previous: f64,
    /// Reproduction number at the end of the window
    pub rt: Option<f64>,
}

/// Snapshot of every department for the window ending on the last day
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub window_days: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<SnapshotRow>,
}

impl Snapshot {
    pub fn by_code(&self, code: &str) -> Option<&SnapshotRow> {
        self.rows.iter().find(|r| r.code == code)
    }

    pub fn by_name(&self, name: &str) -> Option<&SnapshotRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build snapshot rows for the most recent complete window.
///
/// Totals sum the defined days of the window. Rt is read from the
/// department's Rt series on the last day, so it stays undefined when the
/// window has gaps.
pub fn build_snapshot(
    table: &RegionalTable,
    rt: &RtTable,
    names: &RegionNames,
    window: usize,
) -> PrepareResult<Snapshot> {
    let (Some(start), Some(end)) = (table.start(), table.end()) else {
        return Err(PrepareError::InsufficientData("empty regional table".to_string()));
    };
    if table.days() < window {
        return Err(PrepareError::InsufficientData(format!(
            "{} days available, snapshot needs {}",
            table.days(),
            window
        )));
    }

    let mut rows = Vec::with_capacity(table.region_count());
    for (code, positive) in table.positive_series() {
        if is_excluded(code) {
            continue;
        }
        let name = names
            .name(code)
            .ok_or_else(|| PrepareError::UnknownRegion(code.to_string()))?;

        let tested = table
            .tested(code)
            .map(|t| t.tail_sum(window))
            .unwrap_or(0.0);

        let values = positive.values();
        let positive_previous = values
            .len()
            .checked_sub(2 * window)
            .and_then(|from| window_sum(&values[from..from + window]))
            .unwrap_or(0.0);

        rows.push(SnapshotRow {
            code: code.to_string(),
            name: name.to_string(),
            positive: positive.tail_sum(window),
            tested,
            positive_previous,
            rt: rt.last_value(code),
        });
    }

    tracing::debug!(rows = rows.len(), %end, "Built snapshot");

    Ok(Snapshot {
        window_days: window,
        start: start.max(end - chrono::Duration::days(window as i64 - 1)),
        end,
        rows,
    })
}
