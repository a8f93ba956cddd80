//! Operation extraction.
//!
//! Turns an interface document (`OpenAPI` 3.x or Swagger 2.0, as a raw JSON value) into an
//! ordered list of [`Operation`]s. Extraction is pure and infallible: malformed fields degrade to
//! empty defaults instead of failing the whole document.

use crate::resolver::RefResolver;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// HTTP methods that become tools, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub const SUPPORTED: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    /// Upper-case wire form (`GET`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Lower-case key used in a path item (`get`).
    #[must_use]
    pub fn path_item_key(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "cookie" => Some(ParamLocation::Cookie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationParameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// JSON Schema primitive type, if the document declares one.
    pub schema_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodyInfo {
    pub required: bool,
    pub description: Option<String>,
}

/// One HTTP method bound to one path template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<OperationParameter>,
    pub request_body: Option<RequestBodyInfo>,
}

/// Extract all supported operations from an interface document.
///
/// Paths are visited in document order and, within a path, methods in
/// [`HttpMethod::SUPPORTED`] order.
#[must_use]
pub fn extract_operations(spec: &Value) -> Vec<Operation> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let resolver = RefResolver::new(spec);
    let mut operations = Vec::new();

    for (path, item) in paths {
        let item = resolver.resolve(item);
        let path_params = item.get("parameters");

        for method in HttpMethod::SUPPORTED {
            let Some(op) = item.get(method.path_item_key()) else {
                continue;
            };
            if op.is_null() {
                continue;
            }
            operations.push(extract_operation(&resolver, path, method, path_params, op));
        }
    }

    operations
}

fn extract_operation(
    resolver: &RefResolver<'_>,
    path: &str,
    method: HttpMethod,
    path_params: Option<&Value>,
    op: &Value,
) -> Operation {
    let empty = Map::new();
    let fields = op.as_object().unwrap_or_else(|| {
        tracing::debug!(%method, path, "operation is not an object; using defaults");
        &empty
    });

    let operation_id = non_empty_str(fields.get("operationId"))
        .map_or_else(|| derive_operation_id(method, path), str::to_string);

    let (parameters, body_param) =
        merge_parameters(resolver, path_params, fields.get("parameters"));

    let request_body = match fields.get("requestBody") {
        Some(v) if !v.is_null() => {
            let body = resolver.resolve(v);
            Some(RequestBodyInfo {
                required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
                description: non_empty_str(body.get("description")).map(str::to_string),
            })
        }
        _ => body_param,
    };

    Operation {
        operation_id,
        method,
        path: path.to_string(),
        summary: non_empty_str(fields.get("summary")).map(str::to_string),
        description: non_empty_str(fields.get("description")).map(str::to_string),
        parameters,
        request_body,
    }
}

/// `<method>_<path with every non-alphanumeric char replaced by '_'>`.
#[must_use]
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let sanitized: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{sanitized}", method.path_item_key())
}

/// Merge path-item and operation parameters.
///
/// Operation parameters override path-item parameters with the same `(location, name)`.
/// A Swagger 2.0 `in: body` parameter is returned separately as request body metadata;
/// `formData` and unknown locations are skipped.
fn merge_parameters(
    resolver: &RefResolver<'_>,
    path_item_params: Option<&Value>,
    operation_params: Option<&Value>,
) -> (Vec<OperationParameter>, Option<RequestBodyInfo>) {
    let mut merged: Vec<OperationParameter> = Vec::new();
    let mut index: HashMap<(ParamLocation, String), usize> = HashMap::new();
    let mut body: Option<RequestBodyInfo> = None;

    for list in [path_item_params, operation_params].into_iter().flatten() {
        let Some(list) = list.as_array() else {
            continue;
        };
        for raw in list {
            let param = resolver.resolve(raw);
            match parse_parameter(param) {
                Some(Parsed::Param(p)) => {
                    let key = (p.location, p.name.clone());
                    if let Some(i) = index.get(&key).copied() {
                        merged[i] = p;
                    } else {
                        index.insert(key, merged.len());
                        merged.push(p);
                    }
                }
                Some(Parsed::Body(b)) => body = Some(b),
                None => {}
            }
        }
    }

    (merged, body)
}

enum Parsed {
    Param(OperationParameter),
    Body(RequestBodyInfo),
}

fn parse_parameter(param: &Value) -> Option<Parsed> {
    let Some(name) = non_empty_str(param.get("name")) else {
        tracing::debug!("skipping parameter without a name");
        return None;
    };
    let location = param.get("in").and_then(Value::as_str).unwrap_or_default();
    let description = non_empty_str(param.get("description")).map(str::to_string);
    let required = param.get("required").and_then(Value::as_bool).unwrap_or(false);

    if location == "body" {
        return Some(Parsed::Body(RequestBodyInfo {
            required,
            description,
        }));
    }

    let Some(location) = ParamLocation::parse(location) else {
        tracing::debug!(name, location, "skipping parameter with unsupported location");
        return None;
    };

    // OpenAPI 3 puts the type under `schema`; Swagger 2 puts it on the parameter itself.
    let schema_type = param
        .get("schema")
        .and_then(|s| s.get("type"))
        .or_else(|| param.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Parsed::Param(OperationParameter {
        name: name.to_string(),
        location,
        required,
        schema_type,
        description,
    }))
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).filter(|s| !s.is_empty())
}
