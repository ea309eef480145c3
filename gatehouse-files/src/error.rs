//! Error types for the file gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors that can occur during file gateway request handling.
///
/// Rendered as `{"code": ..., "message": ...}` with the matching status.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FileGatewayError {
    /// No `{id}.pdf` exists in the content directory.
    #[error("File {0} does not exist.")]
    FileNotFound(String),

    /// The bearer token was absent, empty, or did not match.
    #[error("{0}")]
    AuthenticationFailed(&'static str),

    /// The token request was not form-encoded.
    #[error("Content-Type header missing or invalid.")]
    UnsupportedMediaType,

    /// The token request asked for a grant other than `client_credentials`.
    #[error("Invalid grant type.")]
    InvalidGrantType,

    /// The token request carried no Basic credentials.
    #[error("Authorization header missing.")]
    MissingClientCredentials,

    /// The Basic credentials did not match the configured client.
    #[error("Invalid client ID or secret.")]
    InvalidClient,
}

impl FileGatewayError {
    /// Machine-readable error code sent to clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::InvalidGrantType | Self::MissingClientCredentials => "INVALID_REQUEST",
            Self::InvalidClient => "INVALID_CLIENT",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationFailed(_)
            | Self::MissingClientCredentials
            | Self::InvalidClient => StatusCode::UNAUTHORIZED,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidGrantType => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for FileGatewayError {
    fn into_response(self) -> Response {
        let body = json!({"code": self.code(), "message": self.to_string()});
        (self.status(), Json(body)).into_response()
    }
}
