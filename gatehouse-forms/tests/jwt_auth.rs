//! End-to-end authentication and dispatch tests for the form router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use gatehouse_core::{samples::sample_forms, FormDefinition, Submission};
use gatehouse_forms::{
    create_router, AppState, AuthMode, FormRegistry, FormRegistryBuilder, JwtVerifier, SubmitError,
    SubmitHandler, SubmitResult,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

const SIGNER_PRIVATE: &str = include_str!("fixtures/signer.pem");
const SIGNER_PUBLIC: &str = include_str!("fixtures/signer.pub.pem");
const IMPOSTOR_PRIVATE: &str = include_str!("fixtures/impostor.pem");

const AUDIENCE: &str = "https://gateway.example.com";
const ISSUER: &str = "moveworks";

const SUBMIT_URI: &str = "/forms/123456789/submit";

fn now() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs(),
        Err(e) => panic!("clock before epoch: {e}"),
    }
}

fn verifier() -> Arc<JwtVerifier> {
    match JwtVerifier::new(SIGNER_PUBLIC, AUDIENCE, ISSUER) {
        Ok(v) => Arc::new(v),
        Err(e) => panic!("fixture key must load: {e}"),
    }
}

fn app_with(registry: FormRegistry) -> Router {
    let state = AppState {
        registry,
        auth: AuthMode::Jwt(verifier()),
    };
    create_router(Arc::new(state))
}

/// The sample catalog with every form routed to clones of `handler`.
fn app_with_handler(handler: impl SubmitHandler + Clone + 'static) -> Router {
    let register = |builder: FormRegistryBuilder, form| builder.register(form, handler.clone());
    let registry = sample_forms()
        .into_iter()
        .try_fold(FormRegistry::builder(), register)
        .map(|builder| builder.build());
    match registry {
        Ok(r) => app_with(r),
        Err(e) => panic!("registry must build: {e}"),
    }
}

fn app() -> Router {
    match FormRegistry::sample() {
        Ok(r) => app_with(r),
        Err(e) => panic!("sample registry must build: {e}"),
    }
}

fn sign_with(pem: &str, claims: &Value) -> String {
    let key = match EncodingKey::from_ed_pem(pem.as_bytes()) {
        Ok(k) => k,
        Err(e) => panic!("fixture signing key must load: {e}"),
    };
    match encode(&Header::new(Algorithm::EdDSA), claims, &key) {
        Ok(t) => t,
        Err(e) => panic!("failed to sign token: {e}"),
    }
}

fn valid_claims() -> Value {
    json!({"sub": "integrator", "aud": AUDIENCE, "iss": ISSUER, "exp": now() + 600})
}

fn valid_token() -> String {
    sign_with(SIGNER_PRIVATE, &valid_claims())
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(b) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(b.to_owned())
        }
        None => Body::empty(),
    };
    match builder.body(body) {
        Ok(r) => r,
        Err(e) => panic!("failed to build request: {e}"),
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token, None)
}

fn post(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    request("POST", uri, token, Some(body))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = match app.oneshot(req).await {
        Ok(r) => r,
        Err(e) => panic!("request failed: {e}"),
    };
    let status = resp.status();
    let bytes = match axum::body::to_bytes(resp.into_body(), 1 << 20).await {
        Ok(b) => b,
        Err(e) => panic!("failed to read body: {e}"),
    };
    match serde_json::from_slice(&bytes) {
        Ok(v) => (status, v),
        Err(e) => panic!("invalid JSON: {e}"),
    }
}

async fn expect_auth_failure(req: Request<Body>, message_prefix: &str) {
    let (status, body) = send(app(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTHENTICATION_FAILED");
    let message = body["error"]["message"].as_str().unwrap_or_default();
    assert!(message.starts_with(message_prefix), "got {message}");
}

async fn expect_rejected_token(token: &str) {
    expect_auth_failure(get("/forms", Some(token)), "JWT Verification Failed").await;
}

// ── Authentication ────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_token_lists_forms() {
    let token = valid_token();
    let (status, body) = send(app(), get("/forms", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn missing_authorization_is_rejected() {
    expect_auth_failure(get("/forms", None), "Bearer token missing.").await;
}

#[tokio::test]
async fn garbled_token_is_malformed() {
    expect_auth_failure(get("/forms", Some("garbage")), "Bearer token malformed").await;
}

#[tokio::test]
async fn non_ascii_authorization_header_is_malformed() {
    let value = match header::HeaderValue::from_bytes(b"Bearer \xffgarbled") {
        Ok(v) => v,
        Err(e) => panic!("opaque header bytes must be accepted: {e}"),
    };
    let req = Request::get("/forms")
        .header(header::AUTHORIZATION, value)
        .body(Body::empty());
    let req = match req {
        Ok(r) => r,
        Err(e) => panic!("failed to build request: {e}"),
    };
    expect_auth_failure(req, "Bearer token malformed").await;
}

#[tokio::test]
async fn token_signed_by_another_key_fails_verification() {
    expect_rejected_token(&sign_with(IMPOSTOR_PRIVATE, &valid_claims())).await;
}

#[tokio::test]
async fn wrong_audience_or_issuer_fails_verification() {
    let exp = now() + 600;
    let wrong_aud = json!({"aud": "https://elsewhere.example.com", "iss": ISSUER, "exp": exp});
    let wrong_iss = json!({"aud": AUDIENCE, "iss": "someone-else", "exp": exp});
    let no_aud = json!({"iss": ISSUER, "exp": exp});
    for claims in [wrong_aud, wrong_iss, no_aud] {
        expect_rejected_token(&sign_with(SIGNER_PRIVATE, &claims)).await;
    }
}

#[tokio::test]
async fn expired_token_fails_verification() {
    let claims = json!({"aud": AUDIENCE, "iss": ISSUER, "exp": now() - 3600});
    expect_rejected_token(&sign_with(SIGNER_PRIVATE, &claims)).await;
}

#[tokio::test]
async fn hmac_token_is_rejected_before_verification() {
    let secret = EncodingKey::from_secret(SIGNER_PUBLIC.as_bytes());
    let token = match encode(&Header::new(Algorithm::HS256), &valid_claims(), &secret) {
        Ok(t) => t,
        Err(e) => panic!("failed to sign token: {e}"),
    };
    expect_auth_failure(
        get("/forms", Some(&token)),
        "JWT Verification Failed: unsupported algorithm",
    )
    .await;
}

#[tokio::test]
async fn every_form_route_requires_a_token() {
    expect_auth_failure(get("/forms/123456789", None), "Bearer token missing.").await;
    expect_auth_failure(post(SUBMIT_URI, None, "{}"), "Bearer token missing.").await;
}

#[tokio::test]
async fn health_is_public() {
    let (status, _) = send(app(), get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_form_is_not_found_for_authenticated_callers() {
    let token = valid_token();
    let (status, body) = send(app(), get("/forms/nope", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Form ID nope does not exist.");

    let (status, _) = send(app(), post("/forms/nope/submit", Some(&token), "{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_invokes_the_forms_handler_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let handler = move |form: &FormDefinition, submission: &Submission| -> SubmitResult {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(Some(format!("TKT-{}-{}", form.id, submission.len())))
    };

    let token = valid_token();
    let body = r#"{"requested_for": "alice", "permissions": ["banking_manager"]}"#;
    let req = post(SUBMIT_URI, Some(&token), body);
    let (status, resp) = send(app_with_handler(handler), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["ticket_id"], "TKT-123456789-2");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_handler_reports_submission_failed() {
    let handler = |_: &FormDefinition, _: &Submission| -> SubmitResult {
        Err(SubmitError::new("ticketing system unavailable"))
    };

    let token = valid_token();
    let req = post(SUBMIT_URI, Some(&token), "{}");
    let (status, body) = send(app_with_handler(handler), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "SUBMISSION_FAILED");
}
