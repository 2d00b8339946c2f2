//! HTTP response bodies

use serde::{Deserialize, Serialize};

use super::round_dp;
use crate::logic::detector::AnomalyVerdict;
use crate::logic::model::BufferStatus;

/// Reply to a successful telemetry POST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryResponse {
    pub success: bool,
    pub is_anomaly: bool,
    pub confidence: f64,
    pub message: String,
}

impl TelemetryResponse {
    pub fn accepted(verdict: AnomalyVerdict, message: impl Into<String>) -> Self {
        Self {
            success: true,
            is_anomaly: verdict.is_anomaly,
            confidence: round_dp(verdict.confidence, 3),
            message: message.into(),
        }
    }
}

/// Fitted standardization parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerStatus {
    pub mean: f64,
    pub scale: f64,
}

/// Snapshot of the detector and its observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub appliance_id: String,
    pub appliance_name: String,
    pub samples_observed: u64,
    pub model_trained: bool,
    pub samples_at_last_train: Option<u64>,
    pub retrain_count: u64,
    pub buffer: BufferStatus,
    pub scaler: Option<ScalerStatus>,
    pub connected_observers: usize,
}
