//! Input parsers
//!
//! Parses the dashboard inputs from text:
//! - regional daily tests by department (data.gouv.fr `sp-pos-quot-dep` layout)
//! - national feature table
//! - department code/name lookup
//! - department boundaries (GeoJSON)

use super::error::{DataError, DataResult};
use super::types::{FeatureRow, NationalFeatures, RegionNames, RegionalRecord, RegionalTable};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Column names of the regional input
pub const COL_REGION: &str = "dep";
pub const COL_DAY: &str = "jour";
pub const COL_POSITIVE: &str = "P";
pub const COL_TESTED: &str = "T";
/// Age class column; `0` rows hold all-ages totals
pub const COL_AGE_CLASS: &str = "cl_age90";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a calendar date in one of the accepted formats
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Timestamps such as "2020-06-01 00:00:00" keep only the date part
    let raw = raw.split(['T', ' ']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn header_index(
    headers: &csv::StringRecord,
    source_name: &str,
) -> impl Fn(&str) -> DataResult<usize> {
    let positions: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
        .collect();
    let source_name = source_name.to_string();
    move |column: &str| {
        positions
            .get(column)
            .copied()
            .ok_or_else(|| DataError::MissingColumn {
                source_name: source_name.clone(),
                column: column.to_string(),
            })
    }
}

fn parse_number(raw: &str, source_name: &str, line: usize) -> DataResult<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    raw.replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DataError::Parse {
            source_name: source_name.to_string(),
            line,
            message: format!("not a number: {}", raw),
        })
}

/// Parse the regional daily tests file into a table.
///
/// When the age class column is present only the all-ages rows (`0`) are
/// kept. Blank counts are read as zero.
pub fn parse_regional_csv(content: &str, delimiter: u8) -> DataResult<RegionalTable> {
    const SOURCE: &str = "regional";

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let index = header_index(&headers, SOURCE);
    let region_col = index(COL_REGION)?;
    let day_col = index(COL_DAY)?;
    let positive_col = index(COL_POSITIVE)?;
    let tested_col = index(COL_TESTED)?;
    let age_col = index(COL_AGE_CLASS).ok();

    let mut records = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let line = line_num + 2;
        let record = result?;

        if let Some(age_col) = age_col {
            if record.get(age_col).map(str::trim) != Some("0") {
                continue;
            }
        }

        let field = |col: usize| record.get(col).unwrap_or("");
        let code = field(region_col).trim().to_string();
        if code.is_empty() {
            continue;
        }

        let date = parse_date(field(day_col)).ok_or_else(|| DataError::Parse {
            source_name: SOURCE.to_string(),
            line,
            message: format!("invalid date: {}", field(day_col)),
        })?;

        records.push(RegionalRecord {
            code,
            date,
            positive: parse_number(field(positive_col), SOURCE, line)?.unwrap_or(0.0),
            tested: parse_number(field(tested_col), SOURCE, line)?.unwrap_or(0.0),
        });
    }

    if records.is_empty() {
        return Err(DataError::Empty(SOURCE.to_string()));
    }

    tracing::debug!(rows = records.len(), "Parsed regional records");
    Ok(RegionalTable::from_records(&records))
}

/// Parse the national feature table.
///
/// Required columns: `date`, `pos`, `test`. Optional: `age_pos`, `age_test`.
/// Any other numeric column is kept as a named covariate.
pub fn parse_national_csv(content: &str) -> DataResult<NationalFeatures> {
    const SOURCE: &str = "national";

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let index = header_index(&headers, SOURCE);
    let date_col = index("date")?;
    let pos_col = index("pos")?;
    let test_col = index("test")?;
    let age_pos_col = index("age_pos").ok();
    let age_test_col = index("age_test").ok();

    let known = [Some(date_col), Some(pos_col), Some(test_col), age_pos_col, age_test_col];
    let covariate_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !known.contains(&Some(*i)))
        .map(|(i, h)| (i, h.trim().to_string()))
        .filter(|(_, h)| !h.is_empty())
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let line = line_num + 2;
        let record = result?;
        let field = |col: usize| record.get(col).unwrap_or("");

        let date = parse_date(field(date_col)).ok_or_else(|| DataError::Parse {
            source_name: SOURCE.to_string(),
            line,
            message: format!("invalid date: {}", field(date_col)),
        })?;

        let optional = |col: Option<usize>| -> DataResult<Option<f64>> {
            match col {
                Some(col) => parse_number(field(col), SOURCE, line),
                None => Ok(None),
            }
        };

        let mut row = FeatureRow::new(date);
        row.positive = parse_number(field(pos_col), SOURCE, line)?;
        row.tested = parse_number(field(test_col), SOURCE, line)?;
        row.age_positive = optional(age_pos_col)?;
        row.age_tested = optional(age_test_col)?;

        for (col, name) in &covariate_cols {
            // Non-numeric covariates (labels, comments) are skipped
            if let Ok(Some(value)) = parse_number(field(*col), SOURCE, line) {
                row.covariates.insert(name.clone(), value);
            }
        }

        rows.push(row);
    }

    if rows.is_empty() {
        return Err(DataError::Empty(SOURCE.to_string()));
    }

    Ok(NationalFeatures::new(rows))
}

/// Parse the department lookup (`code,name`).
pub fn parse_region_names(content: &str) -> DataResult<RegionNames> {
    const SOURCE: &str = "names";

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let index = header_index(&headers, SOURCE);
    let code_col = index("code")?;
    let name_col = index("name")?;

    let mut names = RegionNames::default();
    for result in reader.records() {
        let record = result?;
        let code = record.get(code_col).unwrap_or("").trim();
        let name = record.get(name_col).unwrap_or("").trim();
        if !code.is_empty() && !name.is_empty() {
            names.insert(code, name);
        }
    }

    if names.is_empty() {
        return Err(DataError::Empty(SOURCE.to_string()));
    }

    Ok(names)
}

/// Parse and validate the department boundaries document.
pub fn parse_geography(content: &str) -> DataResult<serde_json::Value> {
    let geography: serde_json::Value = serde_json::from_str(content)?;

    if geography.get("type").and_then(|t| t.as_str()) != Some("FeatureCollection") {
        return Err(DataError::Geography(
            "expected a GeoJSON FeatureCollection".to_string(),
        ));
    }
    let features = geography
        .get("features")
        .and_then(|f| f.as_array())
        .ok_or_else(|| DataError::Geography("missing features array".to_string()))?;

    let unnamed = features
        .iter()
        .filter(|f| f.pointer("/properties/nom").and_then(|n| n.as_str()).is_none())
        .count();
    if unnamed > 0 {
        tracing::warn!(unnamed, "Geography features without properties.nom");
    }

    Ok(geography)
}
