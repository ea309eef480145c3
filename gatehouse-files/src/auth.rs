//! Optional client authentication for the file gateway.
//!
//! Both mechanisms are off unless configured: a static bearer token checked
//! on every `/v1` request, and a client-credentials token endpoint that hands
//! out that same token.

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::{config::ClientCredentials, error::FileGatewayError, state::SharedState};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const TOKEN_LIFETIME_SECS: u64 = 3600;

const HEADER_MISSING: &str = "Authorization header missing.";
const TOKEN_MISSING: &str = "Bearer token missing.";
const TOKEN_INVALID: &str = "Bearer token invalid.";

/// Body of a successful `POST /oauth2/token`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Middleware rejecting `/v1` requests without the configured bearer token.
///
/// # Errors
/// Returns [`FileGatewayError::AuthenticationFailed`] when a token is
/// configured and the request does not present it.
pub async fn require_bearer(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, FileGatewayError> {
    if let Some(expected) = state.bearer_token.as_deref() {
        if let Err(e) = check_bearer(request.headers(), expected) {
            tracing::warn!(path = %request.uri().path(), reason = %e, "rejected request");
            return Err(e);
        }
    }
    Ok(next.run(request).await)
}

fn check_bearer(headers: &HeaderMap, expected: &str) -> Result<(), FileGatewayError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(FileGatewayError::AuthenticationFailed(HEADER_MISSING))?
        .to_str()
        .map_err(|_| FileGatewayError::AuthenticationFailed(TOKEN_INVALID))?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(FileGatewayError::AuthenticationFailed(TOKEN_MISSING));
    }
    if token != expected {
        return Err(FileGatewayError::AuthenticationFailed(TOKEN_INVALID));
    }
    Ok(())
}

/// `POST /oauth2/token`: client-credentials grant.
///
/// Mounted only when client credentials are configured.
///
/// # Errors
/// Returns [`FileGatewayError::UnsupportedMediaType`] for a non form-encoded
/// body, [`FileGatewayError::InvalidGrantType`] unless
/// `grant_type=client_credentials`, [`FileGatewayError::MissingClientCredentials`]
/// without an Authorization header, and [`FileGatewayError::InvalidClient`]
/// when the Basic credentials do not match.
pub async fn issue_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenResponse>, FileGatewayError> {
    let (Some(credentials), Some(token)) = (&state.client_credentials, &state.bearer_token) else {
        return Err(FileGatewayError::InvalidClient);
    };

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
    if !is_form {
        return Err(FileGatewayError::UnsupportedMediaType);
    }

    let params: Vec<(String, String)> = serde_urlencoded::from_bytes(&body).unwrap_or_default();
    let grant_type = params
        .iter()
        .find(|(k, _)| k == "grant_type")
        .map(|(_, v)| v.as_str());
    if grant_type != Some("client_credentials") {
        return Err(FileGatewayError::InvalidGrantType);
    }

    let authorization = headers
        .get(header::AUTHORIZATION)
        .ok_or(FileGatewayError::MissingClientCredentials)?
        .to_str()
        .map_err(|_| FileGatewayError::InvalidClient)?;
    let encoded = authorization
        .strip_prefix("Basic ")
        .unwrap_or(authorization);
    if !verify_basic(encoded, credentials) {
        tracing::warn!("token request with invalid client credentials");
        return Err(FileGatewayError::InvalidClient);
    }

    tracing::info!(client_id = %credentials.client_id, "issued access token");
    Ok(Json(TokenResponse {
        access_token: token.clone(),
        token_type: "Bearer",
        expires_in: TOKEN_LIFETIME_SECS,
    }))
}

/// Checks base64 `client_id:client_secret` against the configured client.
fn verify_basic(encoded: &str, expected: &ClientCredentials) -> bool {
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    decoded
        .split_once(':')
        .is_some_and(|(id, secret)| id == expected.client_id && secret == expected.client_secret)
}
