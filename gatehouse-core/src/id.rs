use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Opaque identifier of a catalog file.
///
/// The id is the URL-safe base64 encoding of the file name, so every id
/// decodes back to exactly the name it was built from and can be used as a
/// single URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[non_exhaustive]
pub struct FileId(pub String);

impl FileId {
    /// Encodes a file name into its id.
    #[must_use]
    pub fn encode(name: &str) -> Self {
        Self(URL_SAFE.encode(name.as_bytes()))
    }

    /// Decodes the id back into the file name it was built from.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFileId`] if the id is not valid base64 or
    /// the decoded bytes are not UTF-8.
    pub fn decode(&self) -> Result<String, CoreError> {
        let invalid = |reason: String| CoreError::InvalidFileId {
            id: self.0.clone(),
            reason,
        };
        let bytes = URL_SAFE
            .decode(self.0.as_bytes())
            .map_err(|e| invalid(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| invalid(e.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
