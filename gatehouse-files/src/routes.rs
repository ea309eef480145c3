//! Axum route handlers for the file gateway API.

use axum::{
    body::Body,
    extract::{OriginalUri, Path, RawQuery, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gatehouse_core::{catalog, FileRecord, PageRequest};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};

use crate::{auth, error::FileGatewayError, state::SharedState};

// ── Response types ───────────────────────────────────────────────────────────

/// Body of `GET /v1/files`.
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub value: Vec<FileRecord>,
    /// Absent on the last page.
    #[serde(rename = "@odata.nextLink", skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.context")]
    pub context: String,
}

/// Body of `GET /v1/files/{id}`.
#[derive(Debug, Serialize)]
pub struct FileMetadataResponse {
    pub value: FileRecord,
    #[serde(rename = "@odata.context")]
    pub context: String,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router over the given state.
///
/// The bearer check and the token endpoint are only installed when the state
/// carries the corresponding configuration.
pub fn create_router(state: SharedState) -> Router {
    let mut v1 = Router::new()
        .route("/files", get(list_files))
        .route("/files/{id}", get(get_file_metadata))
        .route("/files/{id}/download", get(download_file));
    if state.bearer_token.is_some() {
        let require_bearer = middleware::from_fn_with_state(state.clone(), auth::require_bearer);
        v1 = v1.route_layer(require_bearer);
    }

    let mut app = Router::new().route("/health", get(health)).nest("/v1", v1);
    if state.client_credentials.is_some() {
        app = app.route("/oauth2/token", post(auth::issue_token));
    }

    app.with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health`: liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `GET /v1/files?$skip&$top&$filter`: one page of the synthetic catalog.
///
/// Unparsable or negative `$skip`/`$top` fall back to their defaults.
pub async fn list_files(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
) -> Json<FileListResponse> {
    let request = page_request(query.as_deref(), state.default_page_size);
    let page = state.catalog.list(&request, state.timestamps);

    tracing::debug!(
        offset = request.offset,
        page_size = request.page_size,
        records = page.records.len(),
        last_page = page.next.is_none(),
        "listed files"
    );

    let base = state.public_base_url.as_str();
    Json(FileListResponse {
        value: page.records,
        next_link: page.next.map(|next| next_link(base, &next)),
        context: context_url(base, &uri),
    })
}

/// `GET /v1/files/{id}`: metadata for any id; nothing is looked up.
pub async fn get_file_metadata(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    Path(file_id): Path<String>,
) -> Json<FileMetadataResponse> {
    Json(FileMetadataResponse {
        value: catalog::metadata(&file_id, state.timestamps),
        context: context_url(&state.public_base_url, &uri),
    })
}

/// `GET /v1/files/{id}/download`: stream `{id}.pdf` as an attachment.
///
/// The response is always `application/octet-stream`, whatever the file is.
///
/// # Errors
/// Returns [`FileGatewayError::FileNotFound`] unless `{content_dir}/{id}.pdf`
/// is an existing regular file.
pub async fn download_file(
    State(state): State<SharedState>,
    Path(file_id): Path<String>,
    request: Request,
) -> Result<Response, FileGatewayError> {
    let Some(path) = state.content_path(&file_id) else {
        return Err(FileGatewayError::FileNotFound(file_id));
    };
    let is_file = tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file());
    if !is_file {
        tracing::debug!(path = %path.display(), "download target missing");
        return Err(FileGatewayError::FileNotFound(file_id));
    }

    let served = match ServeFile::new(&path).oneshot(request).await {
        Ok(resp) => resp,
        Err(never) => match never {},
    };
    as_attachment(file_id, served.map(Body::new))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Marks a served file as an octet-stream attachment named `{file_id}.pdf`.
///
/// A 404 or server error from the file service means the file vanished or
/// became unreadable after the existence check.
fn as_attachment(file_id: String, mut response: Response) -> Result<Response, FileGatewayError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND || status.is_server_error() {
        tracing::debug!(file_id = %file_id, %status, "download target unavailable");
        return Err(FileGatewayError::FileNotFound(file_id));
    }

    let headers = response.headers_mut();
    let content_type = HeaderValue::from_static("application/octet-stream");
    headers.insert(header::CONTENT_TYPE, content_type);
    let disposition = format!("attachment; filename=\"{file_id}.pdf\"");
    let disposition = match HeaderValue::from_str(&disposition) {
        Ok(value) => value,
        Err(_) => HeaderValue::from_static("attachment"),
    };
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    tracing::info!(file_id = %file_id, "serving download");
    Ok(response)
}

/// Reads `$skip`, `$top` and `$filter`, keeping the first occurrence of each.
fn page_request(query: Option<&str>, default_page_size: u64) -> PageRequest {
    let pairs: Vec<(String, String)> = query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();

    let offset = numeric_param(&pairs, "$skip").unwrap_or(0);
    let page_size = numeric_param(&pairs, "$top").unwrap_or(default_page_size);
    let filter = first_param(&pairs, "$filter").unwrap_or_default();
    PageRequest::new(offset, page_size, filter)
}

fn first_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn numeric_param(pairs: &[(String, String)], name: &str) -> Option<u64> {
    first_param(pairs, name)?.parse().ok()
}

fn next_link(base: &str, next: &PageRequest) -> String {
    format!(
        "{base}/v1/files?$skip={}&$top={}&$filter={}",
        next.offset,
        next.page_size,
        urlencoding::encode(&next.filter)
    )
}

fn context_url(base: &str, uri: &axum::http::Uri) -> String {
    let path = match uri.path_and_query() {
        Some(pq) => pq.as_str(),
        None => uri.path(),
    };
    format!("{base}{path}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;

    use super::*;
    use crate::{config::Config, state::GatewayState};

    fn test_state() -> SharedState {
        match Config::from_vars(|_| None) {
            Ok(config) => Arc::new(GatewayState::from_config(&config)),
            Err(e) => panic!("default config must load: {e}"),
        }
    }

    async fn fetch(uri: &str) -> (StatusCode, serde_json::Value) {
        get_json(create_router(test_state()), uri).await
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = match Request::builder().uri(uri).body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        let status = resp.status();
        let bytes = match axum::body::to_bytes(resp.into_body(), usize::MAX).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        match serde_json::from_slice(&bytes) {
            Ok(v) => (status, v),
            Err(e) => panic!("invalid JSON: {e}"),
        }
    }

    #[tokio::test]
    async fn health_response_format_returns_ok_with_status_field() {
        let (status, body) = fetch("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn list_files_returns_page_with_continuation() {
        let (status, body) = fetch("/v1/files?$skip=0&$top=10").await;
        assert_eq!(status, StatusCode::OK);
        let value = body["value"].as_array().map_or(0, Vec::len);
        assert_eq!(value, 9, "floor truncation drops one record");
        assert_eq!(body["value"][0]["name"], "1_150_kb.pdf");
        assert_eq!(body["value"][0]["id"], "MV8xNTBfa2IucGRm");
        let next = "http://127.0.0.1:5001/v1/files?$skip=10&$top=10&$filter=";
        assert_eq!(body["@odata.nextLink"], next);
        let context = "http://127.0.0.1:5001/v1/files?$skip=0&$top=10";
        assert_eq!(body["@odata.context"], context);
    }

    #[tokio::test]
    async fn list_files_is_deterministic() {
        let (_, first) = fetch("/v1/files?$skip=0&$top=10").await;
        let (_, second) = fetch("/v1/files?$skip=0&$top=10").await;
        assert_eq!(first["value"], second["value"]);
    }

    #[tokio::test]
    async fn list_files_omits_next_link_on_last_page() {
        let (_, body) = fetch("/v1/files?$skip=49990&$top=10").await;
        assert!(body.get("@odata.nextLink").is_none());
        assert_eq!(body["value"][0]["name"], "49991_150_kb.pdf");
    }

    #[tokio::test]
    async fn list_files_at_huge_skip_keeps_names_unique() {
        let (status, body) = fetch("/v1/files?$skip=18446744073709551610&$top=10").await;
        assert_eq!(status, StatusCode::OK);
        let Some(values) = body["value"].as_array() else {
            panic!("value must be an array: {body}");
        };
        let mut names: Vec<&str> = values.iter().filter_map(|v| v["name"].as_str()).collect();
        assert_eq!(names.len(), 9);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 9, "names must not repeat");
    }

    #[tokio::test]
    async fn list_files_ignores_malformed_parameters() {
        let (status, body) = fetch("/v1/files?$skip=abc&$top=-3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"].as_array().map_or(0, Vec::len), 1000);
        assert_eq!(body["value"][0]["name"], "1_150_kb.pdf");
    }

    #[tokio::test]
    async fn list_files_carries_encoded_filter() {
        let (_, body) = fetch("/v1/files?$top=100&$filter=status%20eq%20active").await;
        assert_eq!(
            body["@odata.nextLink"],
            "http://127.0.0.1:5001/v1/files?$skip=100&$top=100&$filter=status%20eq%20active"
        );
    }

    #[tokio::test]
    async fn metadata_never_404s() {
        let (status, body) = fetch("/v1/files/anything-at-all").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"]["name"], "anything-at-all");
        assert_eq!(body["value"]["content"]["mime_type"], "application/pdf");
        let context = "http://127.0.0.1:5001/v1/files/anything-at-all";
        assert_eq!(body["@odata.context"], context);
    }

    #[tokio::test]
    async fn download_of_missing_file_returns_file_not_found() {
        let (status, body) = fetch("/v1/files/does-not-exist/download").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "FILE_NOT_FOUND");
    }

    #[tokio::test]
    async fn vanished_download_target_reports_file_not_found() {
        for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
            let mut served = Response::new(Body::empty());
            *served.status_mut() = status;
            let err = match as_attachment("report".to_owned(), served) {
                Ok(r) => panic!("expected FileNotFound for {status}, got {}", r.status()),
                Err(e) => e,
            };
            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let bytes = match axum::body::to_bytes(resp.into_body(), 1024).await {
                Ok(b) => b,
                Err(e) => panic!("failed to read body: {e}"),
            };
            let body: serde_json::Value = match serde_json::from_slice(&bytes) {
                Ok(v) => v,
                Err(e) => panic!("invalid JSON: {e}"),
            };
            assert_eq!(body["code"], "FILE_NOT_FOUND");
        }
    }

    #[test]
    fn served_file_becomes_octet_stream_attachment() {
        let response = match as_attachment("report".to_owned(), Response::new(Body::empty())) {
            Ok(r) => r,
            Err(e) => panic!("successful response must pass through: {e}"),
        };
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
        let disposition = &headers[header::CONTENT_DISPOSITION];
        assert_eq!(disposition, "attachment; filename=\"report.pdf\"");
    }

    #[tokio::test]
    async fn token_endpoint_is_absent_by_default() {
        let req = match Request::post("/oauth2/token").body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match create_router(test_state()).oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn page_request_keeps_first_occurrence() {
        let request = page_request(Some("$top=5&$top=9&$skip=3"), 1000);
        assert_eq!(request, PageRequest::new(3, 5, ""));
        assert_eq!(page_request(None, 250), PageRequest::new(0, 250, ""));
    }

    #[test]
    fn file_list_response_serialization_omits_absent_next_link() {
        let response = FileListResponse {
            value: vec![],
            next_link: None,
            context: "c".to_owned(),
        };
        let json = match serde_json::to_string(&response) {
            Ok(s) => s,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(json, r#"{"value":[],"@odata.context":"c"}"#);
    }
}
