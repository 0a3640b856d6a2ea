//! Interaction Controller
//!
//! Pure state machine behind the dashboard's map clicks and map buttons.
//!
//! - `InteractionState`: graph mode, selected region, active button, scope
//! - `InteractionEvent`: a region click or a button activation
//! - `transition`: `(state, event) → state`, no side effects
//! - `select_view`: which detail view a state asks for
//!
//! The state is never stored server-side. The page sends it back with each
//! event and renders whatever comes out.

mod view;

pub use view::{select_view, DetailView};

use serde::{Deserialize, Deserializer, Serialize};

/// Region selected before any click
pub const DEFAULT_REGION: &str = "Paris";

/// What the detail chart plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphMode {
    Confirmed,
    PositivityRate,
    Rt,
}

/// Whether the detail chart covers the selected region or the whole country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Region,
    Country,
}

/// Map buttons, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapButton {
    Confirmed,
    Tested,
    Rt,
    ZoomRegion,
    ZoomCountry,
    ZoomOverseas,
}

impl MapButton {
    pub const ALL: [MapButton; 6] = [
        MapButton::Confirmed,
        MapButton::Tested,
        MapButton::Rt,
        MapButton::ZoomRegion,
        MapButton::ZoomCountry,
        MapButton::ZoomOverseas,
    ];

    /// Position in the map's button bar
    pub fn index(self) -> usize {
        match self {
            MapButton::Confirmed => 0,
            MapButton::Tested => 1,
            MapButton::Rt => 2,
            MapButton::ZoomRegion => 3,
            MapButton::ZoomCountry => 4,
            MapButton::ZoomOverseas => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            MapButton::Confirmed => "Confirmed",
            MapButton::Tested => "Tested",
            MapButton::Rt => "Rt",
            MapButton::ZoomRegion => "Zoom Île-de-France",
            MapButton::ZoomCountry => "Zoom France",
            MapButton::ZoomOverseas => "Zoom overseas",
        }
    }

    /// Graph mode selected by a data-layer button; zoom buttons select none
    pub fn graph_mode(self) -> Option<GraphMode> {
        match self {
            MapButton::Confirmed => Some(GraphMode::Confirmed),
            MapButton::Tested => Some(GraphMode::PositivityRate),
            MapButton::Rt => Some(GraphMode::Rt),
            MapButton::ZoomRegion | MapButton::ZoomCountry | MapButton::ZoomOverseas => None,
        }
    }

    pub fn is_data_layer(self) -> bool {
        self.graph_mode().is_some()
    }
}

/// Current interaction state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub graph_mode: GraphMode,
    pub region: String,
    pub button: MapButton,
    pub scope: Scope,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            graph_mode: GraphMode::Confirmed,
            region: DEFAULT_REGION.to_string(),
            button: MapButton::Confirmed,
            scope: Scope::Region,
        }
    }
}

/// User events fed to the state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    /// A department was clicked on the map; carries its display name
    RegionClicked {
        #[serde(default, deserialize_with = "lenient_location")]
        location: Option<String>,
    },
    /// A map button was activated
    ButtonActivated { button: MapButton },
}

/// Accept any JSON for a click location; only a string survives
fn lenient_location<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

/// Click location, or the default region when missing or blank
fn clicked_region(location: Option<&str>) -> String {
    match location.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_REGION.to_string(),
    }
}

/// Apply one event to the previous state
pub fn transition(prev: &InteractionState, event: &InteractionEvent) -> InteractionState {
    let (region, button) = match event {
        InteractionEvent::RegionClicked { location } => {
            (clicked_region(location.as_deref()), prev.button)
        }
        InteractionEvent::ButtonActivated { button } => (prev.region.clone(), *button),
    };

    let graph_mode = button.graph_mode().unwrap_or(prev.graph_mode);

    let scope = if button == MapButton::ZoomCountry && prev.button != MapButton::ZoomCountry {
        Scope::Country
    } else if button == prev.button && graph_mode == prev.graph_mode && region != prev.region {
        Scope::Region
    } else {
        prev.scope
    };

    let next = InteractionState {
        graph_mode,
        region,
        button,
        scope,
    };

    tracing::debug!(?event, ?next, "Interaction transition");
    next
}
