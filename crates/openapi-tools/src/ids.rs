//! Tool identity codec: `<documentId>_<operationId>`.

use crate::document::TOOL_NAME_SEPARATOR;
use std::fmt;

/// Name of the built-in catalog tool. Checked before any identity parsing.
pub const LIST_APIS_TOOL: &str = "list_apis";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolName {
    pub document_id: String,
    pub operation_id: String,
}

impl ToolName {
    #[must_use]
    pub fn new(document_id: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            operation_id: operation_id.into(),
        }
    }

    /// Split on the first separator. Both halves must be non-empty.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (doc, op) = name.split_once(TOOL_NAME_SEPARATOR)?;
        if doc.is_empty() || op.is_empty() {
            return None;
        }
        Some(Self::new(doc, op))
    }

    /// Split using the longest known document id that prefixes `name` followed by the separator.
    ///
    /// Used for documents persisted before ids were restricted, whose ids may themselves
    /// contain the separator.
    #[must_use]
    pub fn parse_with_known_ids<'a>(
        name: &str,
        known_ids: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        known_ids
            .into_iter()
            .filter_map(|id| {
                let op = name.strip_prefix(id)?.strip_prefix(TOOL_NAME_SEPARATOR)?;
                (!id.is_empty() && !op.is_empty()).then_some((id, op))
            })
            .max_by_key(|(id, _)| id.len())
            .map(|(id, op)| Self::new(id, op))
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{TOOL_NAME_SEPARATOR}{}",
            self.document_id, self.operation_id
        )
    }
}
