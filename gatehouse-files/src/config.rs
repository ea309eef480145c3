//! Environment configuration for the file gateway.

use std::net::SocketAddr;
use std::path::PathBuf;

use gatehouse_core::catalog::{DEFAULT_PAGE_SIZE, FILE_LIMIT};
use gatehouse_core::TimestampMode;

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("FILE_GATEWAY_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("token issuance needs a client id, client secret and bearer token together")]
    IncompleteOAuth,
}

/// Client id and secret accepted by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// File gateway configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    pub bind: SocketAddr,
    /// Scheme and authority used to build context and continuation URLs.
    pub public_base_url: String,
    /// Directory holding `{id}.pdf` download targets.
    pub content_dir: PathBuf,
    pub timestamps: TimestampMode,
    pub default_page_size: u64,
    pub file_limit: u64,
    /// When set, every `/v1` request must carry `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
    /// When set, `POST /oauth2/token` issues `bearer_token` to this client.
    pub client_credentials: Option<ClientCredentials>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `FILE_GATEWAY_BIND`: socket address (default: 127.0.0.1:5001)
    /// - `FILE_GATEWAY_PUBLIC_BASE_URL`: external base URL (default: http://{bind})
    /// - `FILE_GATEWAY_CONTENT_DIR`: download directory (default: ./sample-content)
    /// - `FILE_GATEWAY_LIVE_TIMESTAMPS`: stamp records with the current time (default: false)
    /// - `FILE_GATEWAY_PAGE_SIZE`: default page size (default: 1000)
    /// - `FILE_GATEWAY_FILE_LIMIT`: catalog ceiling (default: 50000)
    /// - `FILE_GATEWAY_BEARER_TOKEN`: static bearer token (optional)
    /// - `FILE_GATEWAY_CLIENT_ID`, `FILE_GATEWAY_CLIENT_SECRET`: token endpoint client (optional)
    ///
    /// # Errors
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBind`] or [`ConfigError::InvalidNumber`]
    /// for unparsable values, and [`ConfigError::IncompleteOAuth`] when only
    /// part of the token endpoint configuration is present.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let bind_str = var("FILE_GATEWAY_BIND").unwrap_or_else(|| "127.0.0.1:5001".to_owned());
        let Ok(bind) = bind_str.parse::<SocketAddr>() else {
            return Err(ConfigError::InvalidBind(bind_str));
        };

        let public_base_url = var("FILE_GATEWAY_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{bind}"))
            .trim_end_matches('/')
            .to_owned();

        let content_dir = var("FILE_GATEWAY_CONTENT_DIR")
            .map_or_else(|| PathBuf::from("./sample-content"), PathBuf::from);

        let timestamps = if var("FILE_GATEWAY_LIVE_TIMESTAMPS").is_some_and(|v| is_truthy(&v)) {
            TimestampMode::Now
        } else {
            TimestampMode::Fixed
        };

        let number = |key: &'static str, default: u64| parse_number(key, var(key), default);
        let default_page_size = number("FILE_GATEWAY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let file_limit = number("FILE_GATEWAY_FILE_LIMIT", FILE_LIMIT)?;

        let bearer_token = var("FILE_GATEWAY_BEARER_TOKEN");
        let client_id = var("FILE_GATEWAY_CLIENT_ID");
        let client_secret = var("FILE_GATEWAY_CLIENT_SECRET");
        let client_credentials = match (client_id, client_secret) {
            (None, None) => None,
            (Some(client_id), Some(client_secret)) if bearer_token.is_some() => {
                Some(ClientCredentials {
                    client_id,
                    client_secret,
                })
            }
            _ => return Err(ConfigError::IncompleteOAuth),
        };

        Ok(Self {
            bind,
            public_base_url,
            content_dir,
            timestamps,
            default_page_size,
            file_limit,
            bearer_token,
            client_credentials,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes")
}

fn parse_number(
    var: &'static str,
    value: Option<String>,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse() {
        Ok(n) => Ok(n),
        Err(_) => Err(ConfigError::InvalidNumber { var, value }),
    }
}
