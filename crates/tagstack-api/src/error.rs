//! HTTP error mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

/// Error returned by every handler; renders as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    Internal(tagstack_core::Error),
    NotFound(String),
    BadRequest(String),
}

impl From<tagstack_core::Error> for ApiError {
    fn from(err: tagstack_core::Error) -> Self {
        use tagstack_core::Error;
        match &err {
            Error::NotFound(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidInput(_)
            | Error::InvalidParent(_)
            | Error::SelfParent(_)
            | Error::HierarchyCycle { .. }
            | Error::TagNotFound(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
