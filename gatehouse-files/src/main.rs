//! Entry point for the `gatehouse-files` HTTP server.

use std::sync::Arc;

use gatehouse_files::{create_router, Config, GatewayState};
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

    let state = Arc::new(GatewayState::from_config(&config));
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.bind, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(
        addr = %config.bind,
        content_dir = %config.content_dir.display(),
        bearer_auth = config.bearer_token.is_some(),
        token_endpoint = config.client_credentials.is_some(),
        "gatehouse-files listening"
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
