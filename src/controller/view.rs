//! Detail view selection

use super::{GraphMode, InteractionState, Scope};
use serde::Serialize;

/// Detail chart requested by an interaction state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailView {
    CountryRt,
    RegionRt { region: String },
    /// National only
    Positivity,
    RegionCases { region: String },
}

pub fn select_view(state: &InteractionState) -> DetailView {
    match (state.graph_mode, state.scope) {
        (GraphMode::Rt, Scope::Country) => DetailView::CountryRt,
        (GraphMode::Rt, Scope::Region) => DetailView::RegionRt {
            region: state.region.clone(),
        },
        (GraphMode::PositivityRate, _) => DetailView::Positivity,
        (GraphMode::Confirmed, _) => DetailView::RegionCases {
            region: state.region.clone(),
        },
    }
}
