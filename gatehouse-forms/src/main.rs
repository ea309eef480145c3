//! Entry point for the `gatehouse-forms` HTTP server.

use std::sync::Arc;

use gatehouse_forms::{create_router, AppState, AuthMode, Config, FormRegistry};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let auth = match config.auth_mode() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %e, "cannot load verification key");
            std::process::exit(1);
        }
    };
    if matches!(auth, AuthMode::Disabled) {
        tracing::warn!("authentication disabled; every caller is accepted");
    }

    let registry = match FormRegistry::sample() {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "invalid form catalog");
            std::process::exit(1);
        }
    };
    let forms = registry.len();

    let app = create_router(Arc::new(AppState { registry, auth }));

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.bind, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(
        addr = %config.bind,
        forms,
        audience = %config.audience,
        issuer = %config.issuer,
        "gatehouse-forms listening"
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
