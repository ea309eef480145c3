//! Bearer JWT authentication for the form gateway.
//!
//! Tokens are verified against a configured public key. The algorithm is read
//! from the token's unverified header but must belong to the key's family, so a
//! public key can never be used as an HMAC secret.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::{error::FormGatewayError, routes::SharedState};

const NON_ASCII_HEADER: &str = "Authorization header is not visible ASCII";

/// Reasons a request fails authentication. All surface as `AUTHENTICATION_FAILED`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No Authorization header, or an empty bearer token.
    #[error("Bearer token missing.")]
    MissingToken,

    /// The token's header could not be decoded.
    #[error("Bearer token malformed: {0}")]
    MalformedToken(String),

    /// The token is signed with an algorithm the configured key cannot verify.
    #[error("JWT Verification Failed: unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    /// Signature, audience, issuer, or time-based claim check failed.
    #[error("JWT Verification Failed: {0}")]
    Verification(String),

    /// The configured public key is not an RSA, EC or Ed25519 PEM key.
    #[error("public key is not a PEM encoded RSA, EC or Ed25519 key")]
    InvalidPublicKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    fn verifies(self, alg: Algorithm) -> bool {
        use Algorithm::{EdDSA, ES256, ES384, PS256, PS384, PS512, RS256, RS384, RS512};
        match self {
            KeyFamily::Rsa => matches!(alg, RS256 | RS384 | RS512 | PS256 | PS384 | PS512),
            KeyFamily::Ec => matches!(alg, ES256 | ES384),
            KeyFamily::Ed => matches!(alg, EdDSA),
        }
    }
}

/// Verifies bearer tokens against one public key, audience and issuer.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    family: KeyFamily,
    audience: String,
    issuer: String,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("family", &self.family)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    /// Creates a verifier from a PEM encoded public key.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidPublicKey`] if the PEM is not an RSA, EC or
    /// Ed25519 public key.
    pub fn new(
        public_key_pem: &str,
        audience: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let pem = public_key_pem.as_bytes();
        let (key, family) = if let Ok(key) = DecodingKey::from_rsa_pem(pem) {
            (key, KeyFamily::Rsa)
        } else if let Ok(key) = DecodingKey::from_ec_pem(pem) {
            (key, KeyFamily::Ec)
        } else if let Ok(key) = DecodingKey::from_ed_pem(pem) {
            (key, KeyFamily::Ed)
        } else {
            return Err(AuthError::InvalidPublicKey);
        };
        Ok(Self {
            key,
            family,
            audience: audience.into(),
            issuer: issuer.into(),
        })
    }

    /// Verifies the raw `Authorization` header value and returns the claims.
    ///
    /// Audience and issuer must be present and match; `exp` and `nbf` are
    /// enforced when present.
    ///
    /// # Errors
    /// See [`AuthError`].
    pub fn verify(&self, authorization: Option<&str>) -> Result<Map<String, Value>, AuthError> {
        let raw = authorization.ok_or(AuthError::MissingToken)?;
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let header = match decode_header(token) {
            Ok(header) => header,
            Err(e) => return Err(AuthError::MalformedToken(e.to_string())),
        };
        if !self.family.verifies(header.alg) {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["aud", "iss"]);

        decode::<Map<String, Value>>(token, &self.key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Verification(e.to_string()))
    }
}

/// How the form routes authenticate callers.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AuthMode {
    /// Every request must carry a valid bearer JWT.
    Jwt(Arc<JwtVerifier>),
    /// No authentication. Only for local development.
    Disabled,
}

/// Middleware enforcing the configured [`AuthMode`].
///
/// # Errors
/// Returns [`FormGatewayError::Authentication`] when verification fails.
pub async fn require_jwt(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, FormGatewayError> {
    if let AuthMode::Jwt(verifier) = &state.auth {
        match authorization_header(request.headers()).and_then(|value| verifier.verify(value)) {
            Ok(claims) => {
                tracing::debug!(subject = ?claims.get("sub"), "authenticated request");
            }
            Err(e) => {
                tracing::warn!(path = %request.uri().path(), reason = %e, "rejected request");
                return Err(e.into());
            }
        }
    }
    Ok(next.run(request).await)
}

/// Reads the `Authorization` header. A header that is present but not
/// visible ASCII is malformed rather than missing.
fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    match value.to_str() {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(AuthError::MalformedToken(NON_ASCII_HEADER.to_owned())),
    }
}
