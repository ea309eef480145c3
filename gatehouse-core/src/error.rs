/// Errors produced by the `gatehouse-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A file id was not valid URL-safe base64 or did not decode to UTF-8.
    #[error("invalid file id '{id}': {reason}")]
    InvalidFileId { id: String, reason: String },

    /// The bucket proportion table is empty or its weights do not sum to 100.
    #[error("invalid bucket table: {reason}")]
    InvalidBucketTable { reason: String },

    /// Two fields of the same form share a name.
    #[error("form '{form_id}' declares field '{field}' more than once")]
    DuplicateField { form_id: String, field: String },

    /// A dynamic field rule refers to a field the form does not declare.
    #[error("rule '{rule}' of form '{form_id}' references unknown field '{field}'")]
    UnknownRuleField {
        form_id: String,
        rule: String,
        field: String,
    },
}
