//! View Renderer
//!
//! Pure functions from a prepared `Dataset` to Plotly figures.
//!
//! - [`charts`]: national cases, Rt grid, Rt and cases details, positivity
//! - [`map`]: choropleth with data layers and zoom buttons
//! - [`detail`]: the detail chart for a `DetailView`
//! - [`risk`]: risk color rule

pub mod charts;
pub mod detail;
pub mod figure;
pub mod map;
pub mod risk;

pub use charts::{
    country_rt_figure, national_cases_figure, positivity_figure, region_cases_figure,
    region_rt_figure, rt_grid_figure,
};
pub use detail::render_detail;
pub use figure::{Annotation, Figure, Layout, Trace};
pub use map::choropleth_figure;
pub use risk::{RiskLevel, RISK_CASE_THRESHOLD};

use crate::analysis::AnalysisError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Nothing to render: {0} is empty")]
    Empty(String),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

pub type RenderResult<T> = Result<T, RenderError>;
