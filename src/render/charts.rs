//! Line and bar charts

use super::figure::{Annotation, Figure, Layout, Trace};
use super::risk::RiskLevel;
use super::{RenderError, RenderResult};
use crate::analysis::{estimate_rt, rolling_sum, DEFAULT_WINDOW_DAYS};
use crate::data::DailySeries;
use crate::forecast::{FUTURE_TARGET, PAST_HISTORY};
use crate::prepare::{CasePoint, Dataset, NationalPlotData, PositivityPoint, SNAPSHOT_WINDOW_DAYS};
use serde_json::json;

/// Columns of the multi-panel Rt grid
pub const GRID_COLUMNS: usize = 4;

const GRID_ROW_HEIGHT: usize = 200;

fn totals(points: &[CasePoint]) -> impl Iterator<Item = (chrono::NaiveDate, Option<f64>)> + '_ {
    points.iter().map(|p| (p.date, p.total))
}

fn dailies(points: &[CasePoint]) -> impl Iterator<Item = (chrono::NaiveDate, Option<f64>)> + '_ {
    points.iter().map(|p| (p.date, p.daily))
}

/// National totals (lines) and dailies (secondary axis) with the forecast
pub fn national_cases_figure(plot: &NationalPlotData) -> Figure {
    let title = format!(
        "Model trained until {}, {}-day history, {}-day horizon, predictions until {}",
        plot.model_date,
        PAST_HISTORY,
        FUTURE_TARGET,
        plot.last_predicted_date()
    );

    let layout = Layout::titled(title)
        .set("xaxis", json!({ "title": { "text": "Date" } }))
        .set("yaxis", json!({ "title": { "text": "Total cases" } }))
        .set(
            "yaxis2",
            json!({
                "title": { "text": "Daily cases" },
                "overlaying": "y",
                "side": "right",
                "showgrid": false
            }),
        )
        .set("legend", json!({ "orientation": "h" }));

    let mut figure = Figure::new(layout);
    figure.push(Trace::scatter("Total cases").points(totals(&plot.actual)).color("blue"));
    figure.push(
        Trace::scatter("Total cases (re-estimated)")
            .points(totals(&plot.re_estimated))
            .color("red"),
    );
    figure.push(
        Trace::scatter("Total cases (predicted)")
            .points(totals(&plot.predicted))
            .color("orange"),
    );
    figure.push(
        Trace::bar("Daily cases")
            .points(dailies(&plot.actual))
            .color("blue")
            .on_secondary_axis(),
    );
    figure.push(
        Trace::scatter("Daily cases (re-estimated)")
            .points(dailies(&plot.re_estimated))
            .mode("markers")
            .color("red")
            .on_secondary_axis(),
    );
    figure.push(
        Trace::scatter("Daily cases (predicted)")
            .points(dailies(&plot.predicted))
            .mode("markers")
            .color("orange")
            .on_secondary_axis(),
    );
    figure
}

/// Hint under the detail charts that follow map clicks
pub const MAP_HINT: &str = "<i>Click on Map to Update this Curve</i>";

/// Dashed Rt = 1 line across the series' date range
fn reference_line(series: &DailySeries, axes: usize) -> Option<Trace> {
    let end = series.end()?;
    Some(
        Trace::scatter("Rt = 1")
            .points([(series.start(), Some(1.0)), (end, Some(1.0))])
            .color("red")
            .dashed()
            .axes(axes)
            .hidden_from_legend(),
    )
}

fn display_name<'a>(dataset: &'a Dataset, code: &'a str) -> &'a str {
    dataset.names.name(code).unwrap_or(code)
}

fn format_rt(rt: Option<f64>) -> String {
    rt.map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Note placed below a detail chart
fn hint(text: &str) -> Annotation {
    Annotation::paper(text, 0.0, -0.18)
}

/// Latest Rt with its date, and the case total of the last window
fn rt_subtitle(rt: &DailySeries, cases: f64) -> String {
    let date = rt
        .end()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Rt: <b>{}</b> on {}<br>sum cases: <b>{:.0}</b> (last {} days)",
        format_rt(rt.last()),
        date,
        cases,
        SNAPSHOT_WINDOW_DAYS
    )
}

/// 14-day case total of a department from its snapshot row
fn region_cases(dataset: &Dataset, code: &str) -> f64 {
    dataset.snapshot.by_code(code).map_or(0.0, |row| row.positive)
}

/// Risk of a department from its snapshot row
fn region_risk(dataset: &Dataset, code: &str) -> RiskLevel {
    dataset
        .snapshot
        .by_code(code)
        .map(|row| RiskLevel::classify(row.rt, row.positive))
        .unwrap_or(RiskLevel::Low)
}

/// One Rt panel per department, colored by risk
pub fn rt_grid_figure(dataset: &Dataset) -> Figure {
    let codes: Vec<&str> = dataset.panel_codes().collect();
    let rows = codes.len().div_ceil(GRID_COLUMNS).max(1);

    let mut layout = Layout::titled(format!(
        "Rt: estimated reproduction number per department (until {})",
        dataset.data_date
    ))
    .set(
        "grid",
        json!({ "rows": rows, "columns": GRID_COLUMNS, "pattern": "independent" }),
    )
    .set("height", json!(rows * GRID_ROW_HEIGHT))
    .set("showlegend", json!(false));

    let mut data = Vec::with_capacity(codes.len() * 2);
    for (i, code) in codes.iter().enumerate() {
        let Some(rt) = dataset.rt.get(code) else {
            continue;
        };
        let axes = i + 1;
        let name = display_name(dataset, code);
        let color = region_risk(dataset, code).color();
        let label = format!(
            "{} - {}<br>Rt=<b>{}</b> cases={:.0}",
            code,
            name,
            format_rt(rt.last()),
            region_cases(dataset, code)
        );

        data.push(
            Trace::scatter(name)
                .points(rt.iter())
                .color(color)
                .axes(axes)
                .hidden_from_legend(),
        );
        data.extend(reference_line(rt, axes));
        layout = layout.annotate(Annotation::on_axes(label, axes, 0.5, 1.1).color(color));
    }

    Figure { data, layout }
}

/// Rt detail for one department
pub fn region_rt_figure(dataset: &Dataset, code: &str) -> RenderResult<Figure> {
    let rt = dataset
        .rt
        .get(code)
        .ok_or_else(|| RenderError::UnknownRegion(code.to_string()))?;
    let name = display_name(dataset, code);
    let color = region_risk(dataset, code).color();

    let mut figure = Figure::new(
        Layout::titled(format!(
            "Rt - {}<br>{}",
            name,
            rt_subtitle(rt, region_cases(dataset, code))
        ))
        .set("yaxis", json!({ "title": { "text": "Rt" } }))
        .annotate(hint(
            "<i>Click on Map to Update this Curve<br>or Click on \"Zoom France\" for the country curve</i>",
        )),
    );
    figure.push(Trace::scatter(name).points(rt.iter()).color(color));
    figure.data.extend(reference_line(rt, 1));
    Ok(figure)
}

/// Rt of the national positive series
pub fn country_rt_figure(dataset: &Dataset) -> RenderResult<Figure> {
    let positive = dataset
        .national
        .positive_series()
        .ok_or_else(|| RenderError::Empty("national features".to_string()))?;
    let rt = estimate_rt(&positive, DEFAULT_WINDOW_DAYS)?;
    let cases = positive.tail_sum(SNAPSHOT_WINDOW_DAYS);
    let color = RiskLevel::classify(rt.last(), cases).color();

    let mut figure = Figure::new(
        Layout::titled(format!("Rt - France<br>{}", rt_subtitle(&rt, cases)))
            .set("yaxis", json!({ "title": { "text": "Rt" } }))
            .annotate(hint(MAP_HINT)),
    );
    figure.push(Trace::scatter("France").points(rt.iter()).color(color));
    figure.data.extend(reference_line(&rt, 1));
    Ok(figure)
}

/// Daily confirmed cases and their rolling sum for one department
pub fn region_cases_figure(dataset: &Dataset, code: &str) -> RenderResult<Figure> {
    let positive = dataset
        .regional
        .positive(code)
        .ok_or_else(|| RenderError::UnknownRegion(code.to_string()))?;
    let window = rolling_sum(positive, SNAPSHOT_WINDOW_DAYS)?;
    let name = display_name(dataset, code);
    let date = positive
        .end()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    let title = format!(
        "Confirmed cases - {}<br><i>{}:</i> Rt: <b>{}</b><br>{}-day sum: <b>{:.0}</b>",
        name,
        date,
        format_rt(dataset.rt.last_value(code)),
        SNAPSHOT_WINDOW_DAYS,
        window.last().unwrap_or(0.0)
    );
    let layout = Layout::titled(title)
        .set("yaxis", json!({ "title": { "text": "Daily cases" } }))
        .set(
            "yaxis2",
            json!({
                "title": { "text": format!("{}-day total", SNAPSHOT_WINDOW_DAYS) },
                "overlaying": "y",
                "side": "right",
                "showgrid": false
            }),
        )
        .annotate(hint(
            "<i>Click on Map to Update this Curve<br>Country curve not available</i>",
        ));

    Ok(Figure::new(layout)
        .with_trace(Trace::bar("Daily cases").points(positive.iter()).color("blue"))
        .with_trace(
            Trace::scatter(format!("{}-day total", SNAPSHOT_WINDOW_DAYS))
                .points(window.iter())
                .color("red")
                .on_secondary_axis(),
        ))
}

/// National positivity rate and mean age of positive cases
pub fn positivity_figure(points: &[PositivityPoint]) -> Figure {
    let mut title = "Positivity rate - France".to_string();
    if let Some(last) = points.last() {
        title.push_str(&format!(
            "<br><i>{}:</i> positivity rate: <b>{}</b> %<br>mean age of positives: <b>{}</b>",
            last.date,
            last.rate.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v)),
            last.age_positive
                .map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
        ));
    }

    let layout = Layout::titled(title)
        .set("yaxis", json!({ "title": { "text": "Positivity rate (%)" } }))
        .set(
            "yaxis2",
            json!({
                "title": { "text": "Mean age of positive cases" },
                "overlaying": "y",
                "side": "right",
                "showgrid": false
            }),
        )
        .annotate(hint("<i>Only the country curve is available</i>"));

    Figure::new(layout)
        .with_trace(
            Trace::scatter("Positivity rate")
                .points(points.iter().map(|p| (p.date, p.rate)))
                .color("blue"),
        )
        .with_trace(
            Trace::scatter("Mean age")
                .points(points.iter().map(|p| (p.date, p.age_positive)))
                .color("grey")
                .on_secondary_axis(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::fixtures;

    #[test]
    fn test_national_cases_figure() {
        let dataset = fixtures::dataset();
        let figure = national_cases_figure(&dataset.national_plot);

        assert_eq!(figure.data.len(), 6);
        let title = &figure.layout.title.as_ref().unwrap().text;
        assert!(title.contains("14-day history"));
        assert!(title.contains("7-day horizon"));

        let json = figure.to_json();
        assert_eq!(json["data"][0]["line"]["color"], "blue");
        assert_eq!(json["data"][1]["line"]["color"], "red");
        assert_eq!(json["data"][2]["line"]["color"], "orange");
        assert_eq!(json["data"][3]["yaxis"], "y2");
    }

    #[test]
    fn test_rt_grid_colors_and_layout() {
        let dataset = fixtures::dataset();
        let figure = rt_grid_figure(&dataset);

        // Three departments, each with an Rt trace and a reference line
        assert_eq!(figure.data.len(), 6);
        assert_eq!(figure.layout.get("grid").unwrap()["columns"], 4);

        let colors: Vec<_> = figure
            .data
            .iter()
            .filter(|t| t.name.as_deref() != Some("Rt = 1"))
            .map(|t| (t.name.clone().unwrap(), t.line.as_ref().unwrap()["color"].clone()))
            .collect();

        // Lozère grows on a small total, Rhône is flat, Paris grows on a large one
        assert_eq!(colors[0], ("Lozère".to_string(), json!("orange")));
        assert_eq!(colors[1], ("Rhône".to_string(), json!("blue")));
        assert_eq!(colors[2], ("Paris".to_string(), json!("red")));
    }

    #[test]
    fn test_rt_grid_panel_labels() {
        let dataset = fixtures::dataset();
        let figure = rt_grid_figure(&dataset);

        let labels: Vec<&str> = figure
            .layout
            .annotations
            .iter()
            .map(|a| a.text.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "48 - Lozère<br>Rt=<b>2.00</b> cases=28",
                "69 - Rhône<br>Rt=<b>1.00</b> cases=280",
                "75 - Paris<br>Rt=<b>1.50</b> cases=840",
            ]
        );
        assert!(figure.layout.title.unwrap().text.ends_with("(until 2020-10-12)"));
    }

    #[test]
    fn test_rt_grid_reference_line_is_dashed() {
        let dataset = fixtures::dataset();
        let figure = rt_grid_figure(&dataset);
        let line = figure
            .data
            .iter()
            .find(|t| t.name.as_deref() == Some("Rt = 1"))
            .unwrap();

        assert_eq!(line.y, vec![Some(1.0), Some(1.0)]);
        assert_eq!(line.line.as_ref().unwrap()["dash"], "dash");
    }

    #[test]
    fn test_region_figures() {
        let dataset = fixtures::dataset();

        let rt = region_rt_figure(&dataset, "75").unwrap();
        assert_eq!(
            rt.layout.title.as_ref().unwrap().text,
            "Rt - Paris<br>Rt: <b>1.50</b> on 2020-10-12<br>sum cases: <b>840</b> (last 14 days)"
        );
        assert!(rt.layout.annotations[0]
            .text
            .starts_with("<i>Click on Map to Update this Curve"));
        assert_eq!(rt.layout.annotations[0].y, -0.18);

        let cases = region_cases_figure(&dataset, "69").unwrap();
        assert_eq!(cases.data.len(), 2);
        assert_eq!(cases.data[1].y.last().copied().flatten(), Some(280.0));
        assert_eq!(
            cases.layout.title.as_ref().unwrap().text,
            "Confirmed cases - Rhône<br><i>2020-10-12:</i> Rt: <b>1.00</b><br>14-day sum: <b>280</b>"
        );
        assert!(cases.layout.annotations[0].text.contains("Country curve not available"));

        assert!(matches!(
            region_rt_figure(&dataset, "2A"),
            Err(RenderError::UnknownRegion(_))
        ));
    }

    #[test]
    fn test_country_rt_figure() {
        let dataset = fixtures::dataset();
        let figure = country_rt_figure(&dataset).unwrap();

        // National positives are 100 + day: days 28..=41 over days 14..=27
        let last = figure.data[0].y.last().copied().flatten().unwrap();
        assert!((last - 1883.0 / 1687.0).abs() < 1e-9);
        assert_eq!(figure.data[0].line.as_ref().unwrap()["color"], "red");

        assert_eq!(
            figure.layout.title.as_ref().unwrap().text,
            "Rt - France<br>Rt: <b>1.12</b> on 2020-10-12<br>sum cases: <b>1883</b> (last 14 days)"
        );
        assert_eq!(figure.layout.annotations[0].text, MAP_HINT);
    }

    #[test]
    fn test_country_rt_uses_national_features() {
        let mut dataset = fixtures::dataset();
        // Regional totals no longer feed the country curve
        dataset.regional = crate::data::RegionalTable::default();

        let figure = country_rt_figure(&dataset).unwrap();
        let last = figure.data[0].y.last().copied().flatten().unwrap();
        assert!((last - 1883.0 / 1687.0).abs() < 1e-9);
    }

    #[test]
    fn test_positivity_figure() {
        let dataset = fixtures::dataset();
        let figure = positivity_figure(&dataset.positivity);

        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.data[0].y[0], Some(10.0));
        assert_eq!(figure.data[1].y[0], Some(38.5));
        assert_eq!(
            figure.layout.title.unwrap().text,
            "Positivity rate - France<br><i>2020-10-12:</i> positivity rate: <b>14.1</b> %<br>mean age of positives: <b>38.5</b>"
        );
    }
}
