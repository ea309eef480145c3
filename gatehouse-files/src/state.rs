//! Read-only state shared by every request.

use std::path::PathBuf;
use std::sync::Arc;

use gatehouse_core::{FileCatalog, TimestampMode};

use crate::config::{ClientCredentials, Config};

/// Shared handle passed to every handler.
pub type SharedState = Arc<GatewayState>;

/// Everything the handlers need, fixed at startup.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GatewayState {
    pub catalog: FileCatalog,
    pub timestamps: TimestampMode,
    pub default_page_size: u64,
    /// Base URL without a trailing slash.
    pub public_base_url: String,
    pub content_dir: PathBuf,
    pub bearer_token: Option<String>,
    pub client_credentials: Option<ClientCredentials>,
}

impl GatewayState {
    /// Builds the state from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: FileCatalog::with_file_limit(config.file_limit),
            timestamps: config.timestamps,
            default_page_size: config.default_page_size,
            public_base_url: config.public_base_url.clone(),
            content_dir: config.content_dir.clone(),
            bearer_token: config.bearer_token.clone(),
            client_credentials: config.client_credentials.clone(),
        }
    }

    /// Local path of the download target for `file_id`.
    ///
    /// Returns `None` for ids that would escape the content directory.
    #[must_use]
    pub fn content_path(&self, file_id: &str) -> Option<PathBuf> {
        if file_id.is_empty() || file_id.contains(['/', '\\', '\0']) {
            return None;
        }
        Some(self.content_dir.join(format!("{file_id}.pdf")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_dir_only(key: &str) -> Option<String> {
        (key == "FILE_GATEWAY_CONTENT_DIR").then(|| "/srv/content".to_owned())
    }

    fn state() -> GatewayState {
        match Config::from_vars(content_dir_only) {
            Ok(config) => GatewayState::from_config(&config),
            Err(e) => panic!("config must load: {e}"),
        }
    }

    #[test]
    fn content_path_appends_pdf_extension() {
        let expected = PathBuf::from("/srv/content/report.pdf");
        assert_eq!(state().content_path("report"), Some(expected));
    }

    #[test]
    fn content_path_rejects_separators() {
        let state = state();
        assert_eq!(state.content_path("../etc/passwd"), None);
        assert_eq!(state.content_path("a\\b"), None);
        assert_eq!(state.content_path(""), None);
    }
}
