//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use shadehub_domain::error::ShadeHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`ShadeHubError`] to an HTTP response with appropriate status code.
pub struct ApiError(ShadeHubError);

impl From<ShadeHubError> for ApiError {
    fn from(err: ShadeHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ShadeHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ShadeHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ShadeHubError::Plan(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ShadeHubError::SchedulePhrase(err) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ShadeHubError::Nlu(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ShadeHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
