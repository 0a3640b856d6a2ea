//! Plotly figure model
//!
//! Just enough of the Plotly JSON schema for the dashboard charts. Layout
//! keys without a dedicated field (numbered axes, grid, mapbox, menus) go
//! through `Layout::set`.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

/// A chart: traces plus layout, serialized as `{data, layout}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(layout: Layout) -> Self {
        Self {
            data: Vec::new(),
            layout,
        }
    }

    pub fn push(&mut self, trace: Trace) {
        self.data.push(trace);
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    #[default]
    Scatter,
    Bar,
    Choroplethmapbox,
}

/// One Plotly trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub x: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub y: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    /// Per-point text, available to `hovertemplate` as `%{text}`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,

    // Choropleth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featureidkey: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub z: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar: Option<Value>,
}

pub fn date_labels(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<String> {
    dates
        .into_iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

impl Trace {
    pub fn scatter(name: impl Into<String>) -> Self {
        Self {
            kind: TraceKind::Scatter,
            name: Some(name.into()),
            mode: Some("lines".to_string()),
            ..Default::default()
        }
    }

    pub fn bar(name: impl Into<String>) -> Self {
        Self {
            kind: TraceKind::Bar,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn choropleth(name: impl Into<String>) -> Self {
        Self {
            kind: TraceKind::Choroplethmapbox,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn points<I>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        let (x, y): (Vec<NaiveDate>, Vec<Option<f64>>) = points.into_iter().unzip();
        self.x = date_labels(x);
        self.y = y;
        self
    }

    pub fn mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        match self.kind {
            TraceKind::Scatter => {
                self.line = Some(merge(self.line.take(), "color", color));
                self.marker = Some(merge(self.marker.take(), "color", color));
            }
            _ => self.marker = Some(merge(self.marker.take(), "color", color)),
        }
        self
    }

    pub fn dashed(mut self) -> Self {
        self.line = Some(merge(self.line.take(), "dash", "dash"));
        self
    }

    /// Plot against numbered axes, e.g. `axes(3)` for `x3`/`y3`
    pub fn axes(mut self, n: usize) -> Self {
        if n > 1 {
            self.xaxis = Some(format!("x{}", n));
            self.yaxis = Some(format!("y{}", n));
        }
        self
    }

    pub fn on_secondary_axis(mut self) -> Self {
        self.yaxis = Some("y2".to_string());
        self
    }

    pub fn hidden_from_legend(mut self) -> Self {
        self.showlegend = Some(false);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn hover(mut self, template: impl Into<String>) -> Self {
        self.hovertemplate = Some(template.into());
        self
    }
}

fn merge(current: Option<Value>, key: &str, value: &str) -> Value {
    let mut object = match current {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    object.insert(key.to_string(), Value::String(value.to_string()));
    Value::Object(object)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

/// Text placed on the chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: String,
    pub yref: String,
    pub x: f64,
    pub y: f64,
    pub showarrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Value>,
}

impl Annotation {
    /// Annotation in paper coordinates
    pub fn paper(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            xref: "paper".to_string(),
            yref: "paper".to_string(),
            x,
            y,
            showarrow: false,
            font: None,
        }
    }

    /// Annotation relative to the domain of numbered axes
    pub fn on_axes(text: impl Into<String>, n: usize, x: f64, y: f64) -> Self {
        let suffix = if n > 1 { n.to_string() } else { String::new() };
        Self {
            text: text.into(),
            xref: format!("x{} domain", suffix),
            yref: format!("y{} domain", suffix),
            x,
            y,
            showarrow: false,
            font: None,
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.font = Some(serde_json::json!({ "color": color }));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layout {
    pub fn titled(text: impl Into<String>) -> Self {
        Self {
            title: Some(Title { text: text.into() }),
            ..Default::default()
        }
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
