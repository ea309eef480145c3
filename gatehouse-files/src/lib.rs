//! Mock file gateway.
//!
//! Serves a paginated, synthetically generated file catalog under `/v1/files`
//! and streams placeholder PDFs from a local content directory.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::FileGatewayError;
pub use routes::create_router;
pub use state::{GatewayState, SharedState};
