//! Error types for the form gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{auth::AuthError, registry::SubmitError};

/// Errors that can occur during form gateway request handling.
///
/// Rendered as `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FormGatewayError {
    #[error(transparent)]
    Authentication(#[from] AuthError),

    /// The form id is not registered.
    #[error("Form ID {0} does not exist.")]
    FormNotFound(String),

    /// The submission body is not a JSON object.
    #[error("{0}")]
    InvalidRequest(String),

    /// The form's submit handler failed.
    #[error("Submission failed: {0}")]
    SubmissionFailed(#[from] SubmitError),
}

impl FormGatewayError {
    /// Machine-readable error code sent to clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            FormGatewayError::Authentication(_) => "AUTHENTICATION_FAILED",
            FormGatewayError::FormNotFound(_) => "NOT_FOUND",
            FormGatewayError::InvalidRequest(_) => "INVALID_REQUEST",
            FormGatewayError::SubmissionFailed(_) => "SUBMISSION_FAILED",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            FormGatewayError::Authentication(_) => StatusCode::UNAUTHORIZED,
            FormGatewayError::FormNotFound(_) => StatusCode::NOT_FOUND,
            FormGatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FormGatewayError::SubmissionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FormGatewayError {
    fn into_response(self) -> Response {
        let body = json!({"error": {"code": self.code(), "message": self.to_string()}});
        (self.status(), Json(body)).into_response()
    }
}
