//! Interaction Routes
//!
//! - GET /api/v1/state/initial - Initial state and its detail chart
//! - POST /api/v1/interact - Apply an event to a state
//!
//! The client owns the state and sends it back with every event.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{InteractRequest, InteractResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::controller::{select_view, transition, InteractionState};
use crate::render::render_detail;

async fn respond(state: &AppState, interaction: InteractionState) -> ApiResult<InteractResponse> {
    let dataset = state.service.current().await;
    let view = select_view(&interaction);
    let figure = render_detail(&dataset, &view)?;

    Ok(InteractResponse {
        state: interaction,
        view,
        figure,
    })
}

/// GET /api/v1/state/initial
pub async fn initial_state(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<InteractResponse>> {
    Ok(Json(respond(&state, InteractionState::default()).await?))
}

/// POST /api/v1/interact
pub async fn interact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InteractRequest>, JsonRejection>,
) -> ApiResult<Json<InteractResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let next = transition(&request.state, &request.event);
    Ok(Json(respond(&state, next).await?))
}
