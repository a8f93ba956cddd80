//! Management HTTP API for stored API documents.

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use openapi_mcp_tools::document::{ApiDocument, now_timestamp, parse_spec_source};
use openapi_mcp_tools::error::OpenApiToolsError;
use openapi_mcp_tools::store::DocumentStore;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Reverse;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Path-item keys counted as operations in summaries.
const SUMMARY_METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "options", "head"];

/// Request body cap; real-world interface documents often exceed axum's 2 MB default.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<dyn DocumentStore>,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/specs", get(list_specs).post(create_spec))
        .route("/api/specs/{id}", get(get_spec).delete(delete_spec))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(Extension(Arc::new(state)))
}

/// Serve the management API until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(
    addr: SocketAddr,
    state: AdminState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "management API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpecSummary {
    id: String,
    name: String,
    base_url: String,
    created_at: String,
    operations_count: usize,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSpecRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    /// Interface document as an object, or its JSON/YAML source text.
    #[serde(default)]
    spec: Option<Value>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSpecResponse {
    success: bool,
    id: String,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    specs: usize,
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: msg.into() })).into_response()
}

async fn health(Extension(state): Extension<Arc<AdminState>>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(docs) => Json(HealthResponse {
            status: "healthy",
            timestamp: now_timestamp(),
            specs: docs.len(),
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn list_specs(Extension(state): Extension<Arc<AdminState>>) -> impl IntoResponse {
    let docs = match state.store.list().await {
        Ok(docs) => docs,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut summaries: Vec<SpecSummary> = docs.iter().map(|d| summarize(d)).collect();
    sort_newest_first(&mut summaries);
    Json(summaries).into_response()
}

/// Newest `createdAt` first. Timestamps are compared as instants; entries whose timestamp does
/// not parse as RFC 3339 follow, ordered by their raw text.
fn sort_newest_first(summaries: &mut [SpecSummary]) {
    summaries.sort_by_cached_key(|s| {
        let parsed: Option<DateTime<FixedOffset>> =
            DateTime::parse_from_rfc3339(&s.created_at).ok();
        (Reverse(parsed), Reverse(s.created_at.clone()))
    });
}

async fn get_spec(
    Extension(state): Extension<Arc<AdminState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&id).await {
        Ok(Some(doc)) => Json(doc.as_ref().clone()).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Specification not found"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn create_spec(
    Extension(state): Extension<Arc<AdminState>>,
    Json(req): Json<CreateSpecRequest>,
) -> impl IntoResponse {
    let spec = match req.spec {
        Some(Value::String(source)) => match parse_spec_source(&source) {
            Ok(v) => Some(v),
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid OpenAPI specification: {e}"),
                );
            }
        },
        other => other,
    };

    let (Some(id), Some(name), Some(base_url), Some(spec)) = (req.id, req.name, req.base_url, spec)
    else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    let doc = match ApiDocument::new(id, name, base_url, spec, req.created_at) {
        Ok(doc) => doc,
        Err(OpenApiToolsError::InvalidDocument(msg)) => {
            return error_response(StatusCode::BAD_REQUEST, msg);
        }
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let id = doc.id.clone();
    if let Err(e) = state.store.put(doc).await {
        tracing::warn!(document = %id, error = %e, "failed to store API document");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    Json(CreateSpecResponse { success: true, id }).into_response()
}

async fn delete_spec(
    Extension(state): Extension<Arc<AdminState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete(&id).await {
        Ok(true) => Json(SuccessResponse { success: true }).into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Specification not found"),
        Err(OpenApiToolsError::Store(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn summarize(doc: &ApiDocument) -> SpecSummary {
    SpecSummary {
        id: doc.id.clone(),
        name: doc.name.clone(),
        base_url: doc.base_url.clone(),
        created_at: doc.created_at.clone(),
        operations_count: count_path_operations(&doc.spec),
        title: doc.title().unwrap_or("Unknown API").to_string(),
    }
}

/// Counts method entries across all path items, including verbs that do not become tools.
fn count_path_operations(spec: &Value) -> usize {
    spec.get("paths")
        .and_then(Value::as_object)
        .map_or(0, |paths| {
            paths
                .values()
                .map(|item| {
                    SUMMARY_METHODS
                        .iter()
                        .filter(|m| item.get(**m).is_some())
                        .count()
                })
                .sum()
        })
}
