//! Immutable registry of forms and their submit handlers.
//!
//! Built once at startup and shared read-only by every request.

use std::fmt;
use std::sync::Arc;

use gatehouse_core::{
    missing_required, samples::sample_forms, CoreError, FormDefinition, Submission,
};
use indexmap::IndexMap;

/// A submit handler failed to process a submission.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SubmitError(pub String);

/// Outcome of a submit handler: the created ticket id, if any.
pub type SubmitResult = Result<Option<String>, SubmitError>;

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised while building a [`FormRegistry`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The definition violates a structural invariant.
    #[error(transparent)]
    InvalidForm(#[from] CoreError),

    /// Another form with the same id is already registered.
    #[error("form id '{0}' is registered twice")]
    DuplicateForm(String),
}

/// Processes the raw submission of one form.
///
/// Handlers receive the submission unvalidated: enforcing required, visible
/// or type constraints is up to the handler.
pub trait SubmitHandler: Send + Sync {
    /// Handles a submission and returns the created ticket id, if any.
    ///
    /// # Errors
    /// Returns [`SubmitError`] if the submission could not be processed.
    fn submit(&self, form: &FormDefinition, submission: &Submission) -> SubmitResult;
}

impl<F> SubmitHandler for F
where
    F: Fn(&FormDefinition, &Submission) -> SubmitResult + Send + Sync,
{
    fn submit(&self, form: &FormDefinition, submission: &Submission) -> SubmitResult {
        self(form, submission)
    }
}

/// Logs each submission and creates no ticket.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSubmission;

impl SubmitHandler for LogSubmission {
    fn submit(&self, form: &FormDefinition, submission: &Submission) -> SubmitResult {
        let missing = missing_required(form, submission);
        if !missing.is_empty() {
            tracing::warn!(form_id = %form.id, ?missing, "submission lacks required fields");
        }
        tracing::info!(
            form_id = %form.id,
            fields = submission.len(),
            submission = %serde_json::Value::Object(submission.clone()),
            "form submitted"
        );
        Ok(None)
    }
}

/// A registered form and the handler its submissions go to.
pub struct FormEntry {
    pub definition: FormDefinition,
    handler: Arc<dyn SubmitHandler>,
}

impl FormEntry {
    /// Passes `submission` to this form's handler.
    ///
    /// # Errors
    /// Propagates the handler's [`SubmitError`].
    pub fn submit(&self, submission: &Submission) -> SubmitResult {
        self.handler.submit(&self.definition, submission)
    }
}

impl fmt::Debug for FormEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEntry")
            .field("id", &self.definition.id)
            .finish_non_exhaustive()
    }
}

/// Read-only mapping of form id to definition and handler, in registration order.
#[derive(Debug, Default)]
pub struct FormRegistry {
    entries: IndexMap<String, FormEntry>,
}

impl FormRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> FormRegistryBuilder {
        FormRegistryBuilder::default()
    }

    /// Registry of the sample catalog, every form logged by [`LogSubmission`].
    ///
    /// # Errors
    /// Returns [`RegistryError`] if a sample form is invalid.
    pub fn sample() -> Result<Self, RegistryError> {
        let register = |builder: FormRegistryBuilder, form| builder.register(form, LogSubmission);
        sample_forms()
            .into_iter()
            .try_fold(Self::builder(), register)
            .map(FormRegistryBuilder::build)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FormEntry> {
        self.entries.get(id)
    }

    /// All definitions, in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &FormDefinition> {
        self.entries.values().map(|e| &e.definition)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates validated registrations for a [`FormRegistry`].
#[derive(Default)]
pub struct FormRegistryBuilder {
    entries: IndexMap<String, FormEntry>,
}

impl FormRegistryBuilder {
    /// Adds a form and its handler.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidForm`] if the definition fails
    /// validation, or [`RegistryError::DuplicateForm`] if its id is taken.
    pub fn register(
        mut self,
        definition: FormDefinition,
        handler: impl SubmitHandler + 'static,
    ) -> Result<Self, RegistryError> {
        definition.validate()?;
        if self.entries.contains_key(&definition.id) {
            return Err(RegistryError::DuplicateForm(definition.id));
        }
        let id = definition.id.clone();
        let entry = FormEntry {
            definition,
            handler: Arc::new(handler),
        };
        self.entries.insert(id, entry);
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> FormRegistry {
        FormRegistry {
            entries: self.entries,
        }
    }
}
