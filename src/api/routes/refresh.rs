//! Refresh Route
//!
//! - POST /api/v1/refresh?force=true - Reload the data and rebuild the dataset
//!
//! No retries: a failure is reported and the previous dataset keeps serving.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{RefreshQuery, RefreshResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefreshQuery>,
) -> ApiResult<Json<RefreshResponse>> {
    tracing::info!(force = query.force, "Refresh requested");
    let outcome = state.service.refresh(query.force).await?;

    Ok(Json(RefreshResponse {
        status: if outcome.updated { "updated" } else { "unchanged" }.to_string(),
        data_date: outcome.data_date,
        duration_ms: outcome.duration_ms,
    }))
}
