//! Figure Routes
//!
//! - GET /api/v1/figures/national - National cases with the forecast
//! - GET /api/v1/figures/map - Choropleth map
//! - GET /api/v1/figures/rt-grid - Rt per department

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::render::{choropleth_figure, national_cases_figure, rt_grid_figure, Figure};

pub async fn national(State(state): State<Arc<AppState>>) -> Json<Figure> {
    let dataset = state.service.current().await;
    Json(national_cases_figure(&dataset.national_plot))
}

pub async fn map(State(state): State<Arc<AppState>>) -> Json<Figure> {
    let dataset = state.service.current().await;
    Json(choropleth_figure(&dataset))
}

pub async fn rt_grid(State(state): State<Arc<AppState>>) -> Json<Figure> {
    let dataset = state.service.current().await;
    Json(rt_grid_figure(&dataset))
}
