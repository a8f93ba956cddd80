//! Stored interface documents.
//!
//! One [`ApiDocument`] is one persisted record `{id, name, baseUrl, spec, createdAt}`. The `spec`
//! field is the interface document itself, kept as an opaque JSON value (map order preserved).

use crate::error::{OpenApiToolsError, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between document id and operation id in tool names.
pub const TOOL_NAME_SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    pub id: String,
    pub name: String,
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub spec: Value,
    #[serde(default)]
    pub created_at: String,
}

impl ApiDocument {
    /// Build a validated document ready to be stored.
    ///
    /// `base_url` is normalized (trailing `/` stripped) and `created_at` defaults to now.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::InvalidDocument`] if a required field is empty, the id is not
    /// a valid document id, or `spec` carries no `openapi`/`swagger` version marker.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        spec: Value,
        created_at: Option<String>,
    ) -> Result<Self> {
        let id = id.into();
        let name = name.into();
        let base_url = base_url.into();

        if id.is_empty() || name.trim().is_empty() || base_url.trim().is_empty() || spec.is_null()
        {
            return Err(OpenApiToolsError::InvalidDocument(
                "Missing required fields".to_string(),
            ));
        }
        validate_document_id(&id)?;
        if !has_version_marker(&spec) {
            return Err(OpenApiToolsError::InvalidDocument(
                "Invalid OpenAPI specification (missing 'openapi' or 'swagger' version)"
                    .to_string(),
            ));
        }

        Ok(Self {
            id,
            name,
            base_url: normalize_base_url(&base_url),
            spec,
            created_at: created_at
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(now_timestamp),
        })
    }

    /// `info.title` of the interface document, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.spec
            .get("info")
            .and_then(|info| info.get("title"))
            .and_then(Value::as_str)
    }
}

/// Validate a caller-supplied document id.
///
/// Ids become both file names and tool-name prefixes, so only ASCII alphanumerics and `-` are
/// accepted. In particular the tool name separator `_` is rejected so that
/// `<documentId>_<operationId>` always splits back unambiguously.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::InvalidDocument`] describing the offending id.
pub fn validate_document_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(OpenApiToolsError::InvalidDocument(
            "document id must not be empty".to_string(),
        ));
    }
    if let Some(bad) = id.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
        return Err(OpenApiToolsError::InvalidDocument(format!(
            "document id '{id}' contains '{bad}' (allowed: ASCII letters, digits, '-')"
        )));
    }
    Ok(())
}

/// Whether the document declares an `openapi` (3.x) or `swagger` (2.0) version.
#[must_use]
pub fn has_version_marker(spec: &Value) -> bool {
    ["openapi", "swagger"]
        .iter()
        .any(|k| spec.get(k).is_some_and(|v| !v.is_null()))
}

/// Parse an interface document from its source text.
///
/// JSON is a valid subset of YAML, so `serde_yaml` handles both.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::Yaml`] if the text is neither valid JSON nor YAML.
pub fn parse_spec_source(text: &str) -> Result<Value> {
    Ok(serde_yaml::from_str::<Value>(text)?)
}

#[must_use]
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Current time in the stored `createdAt` format (RFC 3339, millisecond precision, `Z`).
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore_spec() -> Value {
        json!({"openapi": "3.0.0", "info": {"title": "Petstore"}, "paths": {}})
    }

    #[test]
    fn new_strips_trailing_slash_and_defaults_created_at() {
        let doc = ApiDocument::new("petstore", "Pets", "https://x/v1/", petstore_spec(), None)
            .expect("valid document");
        assert_eq!(doc.base_url, "https://x/v1");
        assert!(doc.created_at.ends_with('Z'));
        assert_eq!(doc.title(), Some("Petstore"));
    }

    #[test]
    fn new_keeps_explicit_created_at() {
        let doc = ApiDocument::new(
            "petstore",
            "Pets",
            "https://x",
            petstore_spec(),
            Some("2024-01-01T00:00:00.000Z".to_string()),
        )
        .expect("valid document");
        assert_eq!(doc.created_at, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn new_rejects_missing_version_marker() {
        let err = ApiDocument::new("petstore", "Pets", "https://x", json!({"paths": {}}), None)
            .expect_err("no version marker");
        assert!(err.to_string().contains("Invalid OpenAPI specification"));
    }

    #[test]
    fn new_accepts_swagger_marker() {
        let spec = json!({"swagger": "2.0", "paths": {}});
        assert!(ApiDocument::new("legacy", "Legacy", "https://x", spec, None).is_ok());
    }

    #[test]
    fn new_rejects_missing_fields() {
        assert!(ApiDocument::new("", "Pets", "https://x", petstore_spec(), None).is_err());
        assert!(ApiDocument::new("p", " ", "https://x", petstore_spec(), None).is_err());
        assert!(ApiDocument::new("p", "Pets", "", petstore_spec(), None).is_err());
        assert!(ApiDocument::new("p", "Pets", "https://x", Value::Null, None).is_err());
    }

    #[test]
    fn document_ids_reject_separator_and_path_characters() {
        assert!(validate_document_id("pet-store-2").is_ok());
        assert!(validate_document_id("pet_store").is_err());
        assert!(validate_document_id("../etc").is_err());
        assert!(validate_document_id("a/b").is_err());
        assert!(validate_document_id("").is_err());
    }

    #[test]
    fn parse_spec_source_accepts_json_and_yaml() {
        let from_json = parse_spec_source(r#"{"openapi": "3.0.0", "paths": {}}"#).unwrap();
        let from_yaml = parse_spec_source("openapi: 3.0.0\npaths: {}\n").unwrap();
        assert!(has_version_marker(&from_json));
        assert!(has_version_marker(&from_yaml));
        assert!(parse_spec_source(": : :\n  - [").is_err());
    }

    #[test]
    fn persisted_layout_uses_camel_case() {
        let doc = ApiDocument::new(
            "petstore",
            "Pets",
            "https://x",
            petstore_spec(),
            Some("2024-01-01T00:00:00.000Z".to_string()),
        )
        .unwrap();
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["baseUrl"], "https://x");
        assert_eq!(v["createdAt"], "2024-01-01T00:00:00.000Z");
        let back: ApiDocument = serde_json::from_value(v).unwrap();
        assert_eq!(back, doc);
    }
}
