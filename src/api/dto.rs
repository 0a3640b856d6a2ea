//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::controller::{DetailView, InteractionEvent, InteractionState};
use crate::prepare::SnapshotRow;
use crate::render::{Figure, RiskLevel};

// ============================================
// INTERACTION DTOs
// ============================================

/// Event applied to the client's current state
#[derive(Debug, Deserialize)]
pub struct InteractRequest {
    /// State before the event; the initial state when omitted
    #[serde(default)]
    pub state: InteractionState,
    pub event: InteractionEvent,
}

/// New state with the detail chart it selects
#[derive(Debug, Serialize)]
pub struct InteractResponse {
    pub state: InteractionState,
    pub view: DetailView,
    pub figure: Figure,
}

// ============================================
// REFRESH DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    /// Rebuild even when the source reports no new data
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// "updated" or "unchanged"
    pub status: String,
    pub data_date: NaiveDate,
    pub duration_ms: u64,
}

// ============================================
// SNAPSHOT DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct SnapshotRowResponse {
    #[serde(flatten)]
    pub row: SnapshotRow,
    pub risk: RiskLevel,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub data_date: NaiveDate,
    pub window_days: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<SnapshotRowResponse>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub data_date: NaiveDate,
    pub prepared_at: DateTime<Utc>,
    pub regions: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
