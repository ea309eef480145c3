//! Axum route handlers for the form gateway API.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use gatehouse_core::{FormDefinition, Submission};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::{self, AuthMode},
    error::FormGatewayError,
    registry::FormRegistry,
};

/// State shared by every route.
#[derive(Debug)]
pub struct AppState {
    pub registry: FormRegistry,
    pub auth: AuthMode,
}

/// Shared, thread-safe application state.
pub type SharedState = Arc<AppState>;

// ── Response types ───────────────────────────────────────────────────────────

/// Body of `GET /forms`.
#[derive(Debug, Serialize)]
pub struct FormListResponse {
    pub results: Vec<FormDefinition>,
}

/// Body of `POST /forms/{id}/submit`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub ticket_id: Option<String>,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router over the given state.
///
/// Every `/forms` route sits behind [`auth::require_jwt`]; `/health` does not.
pub fn create_router(state: SharedState) -> Router {
    let require_jwt = middleware::from_fn_with_state(state.clone(), auth::require_jwt);
    let forms = Router::new()
        .route("/forms", get(list_forms))
        .route("/forms/{id}", get(get_form))
        .route("/forms/{id}/submit", post(submit_form))
        .route_layer(require_jwt);

    Router::new()
        .route("/health", get(health))
        .merge(forms)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health`: liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `GET /forms`: every registered definition, in registration order.
pub async fn list_forms(State(state): State<SharedState>) -> Json<FormListResponse> {
    let results = state.registry.definitions().cloned().collect();
    Json(FormListResponse { results })
}

/// `GET /forms/{id}`: one definition, rules included as declarative data.
///
/// # Errors
/// Returns `404 NOT_FOUND` for an unregistered id.
pub async fn get_form(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<FormDefinition>, FormGatewayError> {
    state
        .registry
        .get(&id)
        .map(|entry| Json(entry.definition.clone()))
        .ok_or(FormGatewayError::FormNotFound(id))
}

/// `POST /forms/{id}/submit`: hands the raw submission to the form's handler.
///
/// The form id is resolved before the body is inspected, so an unknown form
/// reports 404 even when the body is unusable.
///
/// # Errors
/// Returns `404 NOT_FOUND` for an unregistered id, `400 INVALID_REQUEST` when
/// the body is not a JSON object and `500 SUBMISSION_FAILED` when the handler
/// fails.
pub async fn submit_form(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, FormGatewayError> {
    let Some(entry) = state.registry.get(&id) else {
        return Err(FormGatewayError::FormNotFound(id));
    };
    let submission = match body {
        Ok(Json(submission)) => submission,
        Err(rejection) => return Err(FormGatewayError::InvalidRequest(rejection.body_text())),
    };

    let ticket_id = entry.submit(&submission).inspect_err(|e| {
        tracing::error!(form_id = %id, error = %e, "submit handler failed");
    })?;
    tracing::info!(form_id = %id, ticket_id = ?ticket_id, "submission accepted");
    Ok(Json(SubmitResponse { ticket_id }))
}
