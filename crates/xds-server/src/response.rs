//! Uniform error body for every route.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use xds_core::XdsError;

/// JSON error body: `{"code": 404, "message": "not found"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body.
    pub code: u16,
    /// Error text for the caller.
    pub message: String,
}

impl ErrorResponse {
    /// Build an error body for a status code.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
        }
    }

    /// The HTTP status code of this error.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<&XdsError> for ErrorResponse {
    fn from(err: &XdsError) -> Self {
        Self::new(err.status_code(), err.client_message())
    }
}

impl From<XdsError> for ErrorResponse {
    fn from(err: XdsError) -> Self {
        Self::from(&err)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
