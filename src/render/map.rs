//! Choropleth map of the snapshot rows

use super::figure::{Annotation, Figure, Layout, Trace};
use super::risk::RiskLevel;
use crate::controller::MapButton;
use crate::prepare::{Dataset, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};

/// GeoJSON property matched against the snapshot row names
pub const FEATURE_ID_KEY: &str = "properties.nom";

/// Map center and zoom level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

pub const FRANCE: MapView = MapView {
    lat: 47.0,
    lon: 2.0,
    zoom: 4.25,
};

pub const ILE_DE_FRANCE: MapView = MapView {
    lat: 48.86,
    lon: 2.33,
    zoom: 7.0,
};

pub const OVERSEAS: MapView = MapView {
    lat: 17.0,
    lon: -2.0,
    zoom: 2.0,
};

/// Where a zoom button moves the map
pub fn zoom_target(button: MapButton) -> Option<MapView> {
    match button {
        MapButton::ZoomRegion => Some(ILE_DE_FRANCE),
        MapButton::ZoomCountry => Some(FRANCE),
        MapButton::ZoomOverseas => Some(OVERSEAS),
        MapButton::Confirmed | MapButton::Tested | MapButton::Rt => None,
    }
}

/// Stepwise colorscale giving each risk tier its flat color
fn risk_colorscale() -> Value {
    let steps = RiskLevel::ALL.len() as f64;
    let stops: Vec<Value> = RiskLevel::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, level)| {
            [
                json!([i as f64 / steps, level.color()]),
                json!([(i + 1) as f64 / steps, level.color()]),
            ]
        })
        .collect();
    Value::Array(stops)
}

/// Country-wide caption shown with a data layer
fn layer_annotation(button: MapButton, snapshot: &Snapshot) -> Option<Annotation> {
    let period = format!("{} days to {}", snapshot.window_days, snapshot.end);
    let rows = &snapshot.rows;
    let text = match button {
        MapButton::Confirmed => format!(
            "France: <b>Confirmed</b> cases, total for the {}: <b>{:.0}</b>",
            period,
            rows.iter().map(|r| r.positive).sum::<f64>()
        ),
        MapButton::Tested => format!(
            "France: <b>Tested</b> cases, total for the {}: <b>{:.0}</b>",
            period,
            rows.iter().map(|r| r.tested).sum::<f64>()
        ),
        MapButton::Rt => {
            let count = |level: RiskLevel| {
                rows.iter()
                    .filter(|r| RiskLevel::classify(r.rt, r.positive) == level)
                    .count()
            };
            format!(
                "France: <b>Rt</b> for the {}: <b>{}</b> high risk, <b>{}</b> watch",
                period,
                count(RiskLevel::High),
                count(RiskLevel::Watch)
            )
        }
        MapButton::ZoomRegion | MapButton::ZoomCountry | MapButton::ZoomOverseas => return None,
    };
    Some(Annotation::paper(text, 0.0, 1.0))
}

fn button_entry(button: MapButton, layers: &[MapButton], snapshot: &Snapshot) -> Value {
    match zoom_target(button) {
        Some(view) => json!({
            "label": button.label(),
            "method": "relayout",
            "args": [{
                "mapbox.center": { "lat": view.lat, "lon": view.lon },
                "mapbox.zoom": view.zoom
            }]
        }),
        None => {
            let visible: Vec<bool> = layers.iter().map(|layer| *layer == button).collect();
            let annotations: Vec<Annotation> = layer_annotation(button, snapshot).into_iter().collect();
            json!({
                "label": button.label(),
                "method": "update",
                "args": [{ "visible": visible }, { "annotations": annotations }]
            })
        }
    }
}

/// Three toggleable layers (confirmed, tested, Rt risk) and the map buttons
pub fn choropleth_figure(dataset: &Dataset) -> Figure {
    let snapshot = &dataset.snapshot;
    let names: Vec<String> = snapshot.rows.iter().map(|r| r.name.clone()).collect();
    let layers: Vec<MapButton> = MapButton::ALL
        .iter()
        .copied()
        .filter(|b| b.is_data_layer())
        .collect();

    let layer = |name: &str, z: Vec<Option<f64>>, colorscale: Value, visible: bool| {
        let mut trace = Trace::choropleth(name)
            .visible(visible)
            .hover("%{location}: %{z}<extra></extra>");
        trace.geojson = Some(dataset.geography.clone());
        trace.featureidkey = Some(FEATURE_ID_KEY.to_string());
        trace.locations = names.clone();
        trace.z = z;
        trace.colorscale = Some(colorscale);
        trace.colorbar = Some(json!({ "title": { "text": name } }));
        trace
    };

    let window = snapshot.window_days;
    let risks: Vec<RiskLevel> = snapshot
        .rows
        .iter()
        .map(|r| RiskLevel::classify(r.rt, r.positive))
        .collect();

    let mut rt_layer = layer(
        "Rt",
        risks.iter().map(|level| Some(level.tier())).collect(),
        risk_colorscale(),
        false,
    )
    .hover("%{location}<br>%{text}<extra></extra>");
    rt_layer.text = snapshot
        .rows
        .iter()
        .zip(&risks)
        .map(|(row, level)| {
            let rt = row
                .rt
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string());
            format!("Rt={} cases={:.0}<br>risk: {}", rt, row.positive, level.label())
        })
        .collect();
    rt_layer.zmin = RiskLevel::ALL.first().map(|l| l.tier());
    rt_layer.zmax = RiskLevel::ALL.last().map(|l| l.tier());
    let tickvals: Vec<f64> = RiskLevel::ALL.iter().map(|l| l.tier()).collect();
    let ticktext: Vec<&str> = RiskLevel::ALL.iter().map(|l| l.label()).collect();
    rt_layer.colorbar = Some(json!({
        "title": { "text": "Risk" },
        "tickvals": tickvals,
        "ticktext": ticktext
    }));

    let buttons: Vec<Value> = MapButton::ALL
        .iter()
        .map(|b| button_entry(*b, &layers, snapshot))
        .collect();

    let mut layout = Layout::titled(format!("Last {} days by department", window))
        .set(
            "mapbox",
            json!({
                "style": "carto-positron",
                "center": { "lat": FRANCE.lat, "lon": FRANCE.lon },
                "zoom": FRANCE.zoom
            }),
        )
        .set("margin", json!({ "r": 0, "l": 0, "b": 0, "t": 60 }))
        .set(
            "updatemenus",
            json!([{
                "type": "buttons",
                "direction": "right",
                "active": MapButton::Confirmed.index(),
                "x": 0.0,
                "y": 0.95,
                "xanchor": "left",
                "yanchor": "top",
                "buttons": buttons
            }]),
        );
    layout
        .annotations
        .extend(layer_annotation(MapButton::Confirmed, snapshot));

    Figure::new(layout)
        .with_trace(layer(
            &format!("Confirmed ({} days)", window),
            snapshot.rows.iter().map(|r| Some(r.positive)).collect(),
            json!("Reds"),
            true,
        ))
        .with_trace(layer(
            &format!("Tested ({} days)", window),
            snapshot.rows.iter().map(|r| Some(r.tested)).collect(),
            json!("Blues"),
            false,
        ))
        .with_trace(rt_layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::fixtures;

    #[test]
    fn test_three_layers_keyed_by_name() {
        let dataset = fixtures::dataset();
        let figure = choropleth_figure(&dataset);

        assert_eq!(figure.data.len(), 3);
        for trace in &figure.data {
            assert_eq!(trace.featureidkey.as_deref(), Some("properties.nom"));
            assert_eq!(trace.locations.len(), 3);
        }
        let visible: Vec<_> = figure.data.iter().map(|t| t.visible).collect();
        assert_eq!(visible, vec![Some(true), Some(false), Some(false)]);

        assert_eq!(figure.data[2].zmin, Some(0.0));
        assert_eq!(figure.data[2].zmax, Some(2.0));
    }

    #[test]
    fn test_rt_layer_colored_by_risk_tier() {
        let dataset = fixtures::dataset();
        let figure = choropleth_figure(&dataset);
        let rt_layer = &figure.data[2];

        let tier = |name: &str| {
            let i = rt_layer.locations.iter().position(|l| l == name).unwrap();
            (rt_layer.z[i], rt_layer.text[i].clone())
        };

        let (z, text) = tier("Paris");
        assert_eq!(z, Some(RiskLevel::High.tier()));
        assert_eq!(text, "Rt=1.50 cases=840<br>risk: High");

        let (z, text) = tier("Lozère");
        assert_eq!(z, Some(RiskLevel::Watch.tier()));
        assert!(text.ends_with("risk: Watch"));

        let (z, text) = tier("Rhône");
        assert_eq!(z, Some(RiskLevel::Low.tier()));
        assert!(text.ends_with("risk: Low"));

        let json = figure.to_json();
        let scale = &json["data"][2]["colorscale"];
        assert_eq!(scale[0], json!([0.0, "blue"]));
        assert_eq!(scale[5], json!([1.0, "red"]));
        assert_eq!(
            json["data"][2]["colorbar"]["ticktext"],
            json!(["Low", "Watch", "High"])
        );
        assert!(json["data"][2]["hovertemplate"]
            .as_str()
            .unwrap()
            .contains("%{text}"));
    }

    #[test]
    fn test_data_buttons_swap_layer_annotation() {
        let dataset = fixtures::dataset();
        let json = choropleth_figure(&dataset).to_json();
        let buttons = &json["layout"]["updatemenus"][0]["buttons"];

        let caption = |i: usize| {
            buttons[i]["args"][1]["annotations"][0]["text"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert_eq!(
            caption(0),
            "France: <b>Confirmed</b> cases, total for the 14 days to 2020-10-12: <b>1148</b>"
        );
        assert_eq!(
            caption(1),
            "France: <b>Tested</b> cases, total for the 14 days to 2020-10-12: <b>16800</b>"
        );
        assert_eq!(
            caption(2),
            "France: <b>Rt</b> for the 14 days to 2020-10-12: <b>1</b> high risk, <b>1</b> watch"
        );

        // The confirmed caption is shown before any button is pressed
        assert_eq!(json["layout"]["annotations"][0]["text"], caption(0));
    }

    #[test]
    fn test_buttons_follow_map_button_order() {
        let dataset = fixtures::dataset();
        let json = choropleth_figure(&dataset).to_json();
        let buttons = json["layout"]["updatemenus"][0]["buttons"]
            .as_array()
            .unwrap()
            .clone();

        assert_eq!(buttons.len(), MapButton::ALL.len());
        for (button, entry) in MapButton::ALL.iter().zip(&buttons) {
            assert_eq!(entry["label"], button.label());
        }

        assert_eq!(buttons[1]["args"][0]["visible"], json!([false, true, false]));
        assert_eq!(buttons[4]["method"], "relayout");
        assert_eq!(buttons[4]["args"][0]["mapbox.zoom"], 4.25);
        assert_eq!(buttons[3]["args"][0]["mapbox.center"]["lat"], 48.86);
    }

    #[test]
    fn test_undefined_rt_is_low_risk() {
        let mut dataset = fixtures::dataset();
        dataset.snapshot.rows[0].rt = None;

        let figure = choropleth_figure(&dataset);
        assert_eq!(figure.data[2].z[0], Some(RiskLevel::Low.tier()));
        assert!(figure.data[2].text[0].starts_with("Rt=-"));
    }
}
