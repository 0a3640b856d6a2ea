//! Detail chart for the current interaction state

use super::charts::{country_rt_figure, positivity_figure, region_cases_figure, region_rt_figure};
use super::figure::Figure;
use super::{RenderError, RenderResult};
use crate::controller::{DetailView, DEFAULT_REGION};
use crate::prepare::Dataset;

fn has_series(dataset: &Dataset, code: &str) -> bool {
    dataset.rt.get(code).is_some() && dataset.regional.positive(code).is_some()
}

/// Department code for a display name, falling back to the default region
/// when the name is unknown or its department has no series
fn resolve_code<'a>(dataset: &'a Dataset, name: &str) -> RenderResult<&'a str> {
    if let Some(code) = dataset.names.code(name) {
        if has_series(dataset, code) {
            return Ok(code);
        }
    }
    tracing::debug!(region = %name, "No series for region, using default");
    dataset
        .names
        .code(DEFAULT_REGION)
        .filter(|code| has_series(dataset, code))
        .ok_or_else(|| RenderError::UnknownRegion(name.to_string()))
}

pub fn render_detail(dataset: &Dataset, view: &DetailView) -> RenderResult<Figure> {
    match view {
        DetailView::CountryRt => country_rt_figure(dataset),
        DetailView::RegionRt { region } => region_rt_figure(dataset, resolve_code(dataset, region)?),
        DetailView::Positivity => Ok(positivity_figure(&dataset.positivity)),
        DetailView::RegionCases { region } => {
            region_cases_figure(dataset, resolve_code(dataset, region)?)
        }
    }
}
