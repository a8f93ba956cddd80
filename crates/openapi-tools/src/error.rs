//! Error types for `openapi-mcp-tools`.

use thiserror::Error;

/// Main error type for the translation engine.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// The tool name does not resolve to a stored document.
    #[error("API specification '{0}' not found")]
    UnknownDocument(String),

    /// The document exists but has no operation with this id.
    #[error("Operation '{operation_id}' not found in API '{document_id}'")]
    UnknownOperation {
        document_id: String,
        operation_id: String,
    },

    /// Document rejected by store-side validation (missing fields, bad id, no version marker).
    #[error("Invalid API specification: {0}")]
    InvalidDocument(String),

    /// Transport-level failure (connect, timeout, invalid URL).
    #[error("Request error: {0}")]
    Request(String),

    /// The remote API answered with a non-success status.
    #[error("API returned {status} {reason}: {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    /// Document store failures.
    #[error("Store error: {0}")]
    Store(String),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for translation engine operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
