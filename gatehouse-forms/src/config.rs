//! Environment configuration for the form gateway.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{AuthError, AuthMode, JwtVerifier};

/// Audience expected in bearer tokens unless configured otherwise.
pub const DEFAULT_AUDIENCE: &str = "https://moveworks-gateway.customer.com";
/// Issuer expected in bearer tokens unless configured otherwise.
pub const DEFAULT_ISSUER: &str = "moveworks";

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("FORM_GATEWAY_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("FORM_GATEWAY_PUBLIC_KEY_PATH is unset and FORM_GATEWAY_AUTH_DISABLED is not true")]
    MissingPublicKey,

    #[error("cannot read public key {path}: {source}")]
    UnreadablePublicKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("public key {path} is unusable: {source}")]
    InvalidPublicKey {
        path: PathBuf,
        #[source]
        source: AuthError,
    },
}

/// Form gateway configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    pub bind: SocketAddr,
    /// PEM file holding the token verification key.
    pub public_key_path: Option<PathBuf>,
    pub audience: String,
    pub issuer: String,
    pub auth_disabled: bool,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `FORM_GATEWAY_BIND`: socket address (default: 127.0.0.1:5002)
    /// - `FORM_GATEWAY_PUBLIC_KEY_PATH`: PEM public key for JWT verification
    /// - `FORM_GATEWAY_AUDIENCE`: expected `aud` claim (default: [`DEFAULT_AUDIENCE`])
    /// - `FORM_GATEWAY_ISSUER`: expected `iss` claim (default: [`DEFAULT_ISSUER`])
    /// - `FORM_GATEWAY_AUTH_DISABLED`: skip authentication entirely (default: false)
    ///
    /// # Errors
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBind`] for an unparsable address and
    /// [`ConfigError::MissingPublicKey`] when neither a key nor the explicit
    /// opt-out is configured.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let bind_str = var("FORM_GATEWAY_BIND").unwrap_or_else(|| "127.0.0.1:5002".to_owned());
        let Ok(bind) = bind_str.parse::<SocketAddr>() else {
            return Err(ConfigError::InvalidBind(bind_str));
        };

        let public_key_path = var("FORM_GATEWAY_PUBLIC_KEY_PATH").map(PathBuf::from);
        let auth_disabled = var("FORM_GATEWAY_AUTH_DISABLED").is_some_and(|v| is_truthy(&v));
        if public_key_path.is_none() && !auth_disabled {
            return Err(ConfigError::MissingPublicKey);
        }

        Ok(Self {
            bind,
            public_key_path,
            audience: var("FORM_GATEWAY_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_owned()),
            issuer: var("FORM_GATEWAY_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_owned()),
            auth_disabled,
        })
    }

    /// Reads the public key and builds the authentication mode.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnreadablePublicKey`] or
    /// [`ConfigError::InvalidPublicKey`] if the key file is missing or not a
    /// supported public key.
    pub fn auth_mode(&self) -> Result<AuthMode, ConfigError> {
        if self.auth_disabled {
            return Ok(AuthMode::Disabled);
        }
        let Some(path) = &self.public_key_path else {
            return Err(ConfigError::MissingPublicKey);
        };
        let pem = match std::fs::read_to_string(path) {
            Ok(pem) => pem,
            Err(source) => {
                let path = path.clone();
                return Err(ConfigError::UnreadablePublicKey { path, source });
            }
        };
        match JwtVerifier::new(&pem, self.audience.as_str(), self.issuer.as_str()) {
            Ok(verifier) => Ok(AuthMode::Jwt(Arc::new(verifier))),
            Err(source) => {
                let path = path.clone();
                Err(ConfigError::InvalidPublicKey { path, source })
            }
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes")
}
