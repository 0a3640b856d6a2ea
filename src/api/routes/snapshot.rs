//! Snapshot Route
//!
//! - GET /api/v1/snapshot - Per-department totals with their risk level

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{SnapshotResponse, SnapshotRowResponse};
use crate::api::state::AppState;
use crate::render::RiskLevel;

pub async fn snapshot(State(state): State<Arc<AppState>>) -> Json<SnapshotResponse> {
    let dataset = state.service.current().await;
    let snapshot = &dataset.snapshot;

    let rows = snapshot
        .rows
        .iter()
        .map(|row| SnapshotRowResponse {
            risk: RiskLevel::classify(row.rt, row.positive),
            row: row.clone(),
        })
        .collect();

    Json(SnapshotResponse {
        data_date: dataset.data_date,
        window_days: snapshot.window_days,
        start: snapshot.start,
        end: snapshot.end,
        rows,
    })
}
