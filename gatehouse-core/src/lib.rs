//! Core types for the Gatehouse file and form gateways.
//!
//! Defines the synthetic file catalog and its id codec, the dynamic form
//! model, and the pure evaluation of dynamic field rules. Nothing here knows
//! about HTTP.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod error;
pub mod form;
pub mod id;
pub mod rules;
pub mod samples;

pub use catalog::{Bucket, FileCatalog, FilePage, FileRecord, PageRequest, TimestampMode};
pub use error::CoreError;
pub use form::{
    Condition, DynamicFieldRule, FieldOption, FieldType, FormDefinition, FormField, Logical,
    Operator, RuleAction, Submission,
};
pub use id::FileId;
pub use rules::{evaluate, missing_required, FieldState};
