//! Telemetry ingestion handler

use axum::{body::Bytes, extract::State, Json};
use chrono::Local;

use crate::{AppError, AppState, AppResult};
use crate::models::{TelemetryPayload, TelemetryResponse};

/// Accept one telemetry frame, classify it and broadcast the result
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<TelemetryResponse>> {
    let reading = TelemetryPayload::parse(&body)?.into_reading(Local::now());

    // Classification may refit the forest; keep it off the async workers
    let monitor = state.monitor.clone();
    let result = tokio::task::spawn_blocking(move || monitor.ingest(&reading))
        .await
        .map_err(|e| AppError::InternalError(format!("ingestion task failed: {}", e)))?;

    let message = if result.is_off() {
        "Low power, treated as normal (OFF)".to_string()
    } else {
        format!("{} data received successfully", state.monitor.appliance().name)
    };

    Ok(Json(TelemetryResponse::accepted(result.verdict, message)))
}
