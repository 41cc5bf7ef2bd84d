//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use homepilot_domain::error::HomePilotError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`HomePilotError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(HomePilotError);

impl From<HomePilotError> for ApiError {
    fn from(err: HomePilotError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            HomePilotError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            HomePilotError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            HomePilotError::Hub(err) => {
                tracing::warn!(error = %err, "hub error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            HomePilotError::Routine(err) => {
                tracing::warn!(error = %err, "routine failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            HomePilotError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            HomePilotError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
