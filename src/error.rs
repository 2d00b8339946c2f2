//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced to HTTP callers
#[derive(Debug)]
pub enum AppError {
    /// Missing, empty or unparseable request body
    InvalidPayload(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidPayload(reason) => {
                tracing::debug!("Rejected telemetry payload: {}", reason);
                (StatusCode::BAD_REQUEST, "No data received")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Errors raised while fitting or applying the detector's numeric models.
///
/// These never reach a caller: the detector catches them and fails open.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectorError {
    #[error("training window is empty")]
    EmptyWindow,

    #[error("training window contains non-finite values")]
    NonFiniteWindow,

    #[error("{0} has not been fitted")]
    NotFitted(&'static str),
}

pub type DetectorResult<T> = Result<T, DetectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_payload_is_bad_request() {
        let response = AppError::InvalidPayload("empty body".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No data received");
    }

    #[test]
    fn test_detector_error_display() {
        assert_eq!(DetectorError::NotFitted("scaler").to_string(), "scaler has not been fitted");
    }
}
