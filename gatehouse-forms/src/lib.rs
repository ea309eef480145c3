//! Mock form gateway.
//!
//! Serves a fixed catalog of dynamic forms under `/forms` and dispatches
//! submissions to a per-form handler. Callers authenticate with a bearer JWT.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod config;
pub mod error;
pub mod registry;
pub mod routes;

pub use auth::{AuthError, AuthMode, JwtVerifier};
pub use config::{Config, ConfigError};
pub use error::FormGatewayError;
pub use registry::{
    FormRegistry, FormRegistryBuilder, LogSubmission, RegistryError, SubmitError, SubmitHandler,
    SubmitResult,
};
pub use routes::{create_router, AppState, SharedState};
