//! Tool dispatch: resolve -> bind -> execute.
//!
//! Every call re-reads the document from the store and re-extracts its operations, so a tool
//! always runs against the current document even if it changed after the catalog was listed.

use crate::document::ApiDocument;
use crate::error::{OpenApiToolsError, Result};
use crate::extract::{HttpMethod, Operation, ParamLocation, extract_operations};
use crate::ids::ToolName;
use crate::store::DocumentStore;
use crate::synthesize::REQUEST_BODY_ARGUMENT;
use base64::Engine as _;
use rmcp::model::JsonObject;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default per-request timeout for outbound calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A tool name resolved to its document and operation.
#[derive(Debug, Clone)]
pub struct ResolvedOperation {
    pub document: Arc<ApiDocument>,
    pub operation: Operation,
}

/// Arguments partitioned into a concrete request. Pure function of (operation, arguments).
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRequest {
    pub method: HttpMethod,
    /// Path with placeholders substituted. Unknown placeholders are kept verbatim.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Successful dispatch result, serialized as the tool's text content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub status: u16,
    pub status_text: String,
    pub data: Value,
    pub operation: OperationEcho,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationEcho {
    pub method: HttpMethod,
    /// Path template before substitution.
    pub path: String,
    pub url: String,
}

pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// `timeout = None` disables the per-request timeout.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        client: reqwest::Client,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            store,
            client,
            timeout,
        }
    }

    /// Resolve a tool name to its document and operation.
    ///
    /// # Errors
    ///
    /// - [`OpenApiToolsError::UnknownDocument`] if no stored document matches the name
    /// - [`OpenApiToolsError::UnknownOperation`] if the document has no such operation
    pub async fn resolve(&self, tool_name: &str) -> Result<ResolvedOperation> {
        let (document, operation_id) = self.find_document(tool_name).await?;

        // Duplicate ids: first match wins.
        let operation = extract_operations(&document.spec)
            .into_iter()
            .find(|op| op.operation_id == operation_id)
            .ok_or_else(|| OpenApiToolsError::UnknownOperation {
                document_id: document.id.clone(),
                operation_id,
            })?;

        Ok(ResolvedOperation {
            document,
            operation,
        })
    }

    async fn find_document(&self, tool_name: &str) -> Result<(Arc<ApiDocument>, String)> {
        if let Some(name) = ToolName::parse(tool_name)
            && let Some(doc) = self.store.get(&name.document_id).await?
        {
            return Ok((doc, name.operation_id));
        }

        // Documents persisted with a separator in their id.
        let docs = self.store.list().await?;
        let name = ToolName::parse_with_known_ids(tool_name, docs.iter().map(|d| d.id.as_str()));
        if let Some(name) = name
            && let Some(doc) = docs.into_iter().find(|d| d.id == name.document_id)
        {
            return Ok((doc, name.operation_id));
        }

        let document_id = ToolName::parse(tool_name)
            .map_or_else(|| tool_name.to_string(), |n| n.document_id);
        Err(OpenApiToolsError::UnknownDocument(document_id))
    }

    /// Resolve, bind, and execute a tool call. Single attempt, no retries.
    ///
    /// # Errors
    ///
    /// Resolution errors, or [`OpenApiToolsError::Request`] / [`OpenApiToolsError::Http`] if the
    /// outbound call fails or returns a non-success status.
    pub async fn dispatch(
        &self,
        tool_name: &str,
        arguments: &JsonObject,
    ) -> Result<NormalizedResult> {
        let resolved = self.resolve(tool_name).await?;
        let bound = bind(&resolved.operation, arguments)?;
        self.execute(&resolved, bound).await
    }

    async fn execute(
        &self,
        resolved: &ResolvedOperation,
        bound: BoundRequest,
    ) -> Result<NormalizedResult> {
        let url = build_url(&resolved.document.base_url, &bound.path, &bound.query)?;
        tracing::info!(
            document = %resolved.document.id,
            operation = %resolved.operation.operation_id,
            method = %bound.method,
            url = %redact_url(&url),
            "dispatching tool call"
        );

        let mut request = self
            .client
            .request(bound.method.into(), url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = &bound.body {
            request = request.json(body);
        }
        if let Some(t) = self.timeout {
            request = request.timeout(t);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OpenApiToolsError::Request(sanitize_reqwest_error(&e)))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| OpenApiToolsError::Request(sanitize_reqwest_error(&e)))?;
        let data = parse_response_body(&bytes, content_type.as_deref());

        if !status.is_success() {
            let status_code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("Unknown");
            tracing::warn!(status = status_code, url = %redact_url(&url), "remote API returned an error status");
            return Err(OpenApiToolsError::Http {
                status: status_code,
                reason: reason.to_string(),
                body: data.to_string(),
            });
        }

        Ok(NormalizedResult {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            data,
            operation: OperationEcho {
                method: resolved.operation.method,
                path: resolved.operation.path.clone(),
                url: url.to_string(),
            },
        })
    }
}

/// Partition caller arguments across path, query and body.
///
/// - path: every path parameter with a non-null argument replaces `{name}` (percent-encoded)
/// - query: every query parameter whose key is present, `null` included (sent as empty)
/// - body: `requestBody`, only if the operation declares a body
///
/// # Errors
///
/// [`OpenApiToolsError::Request`] if a path value is a dot segment (`.` or `..`); URL parsing
/// would collapse it and send the call to a different endpoint.
pub fn bind(operation: &Operation, arguments: &JsonObject) -> Result<BoundRequest> {
    let mut path = operation.path.clone();
    let mut query: Vec<(String, String)> = Vec::new();

    for param in &operation.parameters {
        let Some(value) = arguments.get(&param.name) else {
            continue;
        };
        match param.location {
            ParamLocation::Path => {
                if value.is_null() {
                    continue;
                }
                let raw = value_to_string(value);
                if matches!(raw.as_str(), "." | "..") {
                    return Err(OpenApiToolsError::Request(format!(
                        "Invalid value for path parameter '{}': dot segments are not allowed",
                        param.name
                    )));
                }
                let encoded = encode_component(&raw);
                path = path.replace(&format!("{{{}}}", param.name), &encoded);
            }
            ParamLocation::Query => match value {
                Value::Array(items) => {
                    for item in items {
                        query.push((param.name.clone(), value_to_string(item)));
                    }
                }
                other => query.push((param.name.clone(), value_to_string(other))),
            },
            ParamLocation::Header | ParamLocation::Cookie => {}
        }
    }

    let body = operation
        .request_body
        .as_ref()
        .and_then(|_| arguments.get(REQUEST_BODY_ARGUMENT))
        .filter(|v| !v.is_null())
        .cloned();

    Ok(BoundRequest {
        method: operation.method,
        path,
        query,
        body,
    })
}

fn build_url(base_url: &str, path: &str, query: &[(String, String)]) -> Result<Url> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url =
        Url::parse(&url).map_err(|e| OpenApiToolsError::Request(format!("Invalid URL: {e}")))?;

    if !query.is_empty() {
        let query = query
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    Ok(url)
}

/// Parsed JSON when possible, otherwise text; non-UTF-8 payloads are base64-wrapped.
fn parse_response_body(bytes: &[u8], content_type: Option<&str>) -> Value {
    if let Ok(v) = serde_json::from_slice::<Value>(bytes) {
        return v;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => json!({
            "encoding": "base64",
            "mimeType": content_type,
            "data": base64::engine::general_purpose::STANDARD.encode(bytes),
        }),
    }
}

/// Convert a JSON value to a string for URL parameters.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn encode_component(s: &str) -> String {
    // Percent-encode everything except RFC 3986 unreserved characters.
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}

/// Drop credentials, query and fragment before a URL reaches logs or error text.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
