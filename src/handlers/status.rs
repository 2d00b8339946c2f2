//! Monitor status handler

use axum::{extract::State, Json};

use crate::AppState;
use crate::models::MonitorStatus;

/// Detector state and observer count
pub async fn get(State(state): State<AppState>) -> Json<MonitorStatus> {
    Json(state.monitor.status(state.broadcaster.observer_count()))
}
