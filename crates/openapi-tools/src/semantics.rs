//! HTTP semantics helpers.
//!
//! Generates MCP `ToolAnnotations` for synthesized tools from RFC 9110-style method semantics.

use crate::extract::HttpMethod;
use rmcp::model::ToolAnnotations;

/// Generate MCP tool annotations based on HTTP method semantics.
///
/// `openWorldHint` is always `true`: every synthesized tool talks to a remote API.
#[must_use]
pub fn annotations_for_method(method: HttpMethod) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match method {
        HttpMethod::Get => (true, false, Some(true)),
        HttpMethod::Post => (false, false, Some(false)),
        HttpMethod::Put | HttpMethod::Delete => (false, true, Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        HttpMethod::Patch => (false, true, None),
    };

    ToolAnnotations {
        title: None,
        read_only_hint: Some(read_only),
        destructive_hint: Some(destructive),
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

/// Annotations for the built-in catalog tool: it only reads local state.
#[must_use]
pub fn management_annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_set_open_world_for_all_methods() {
        for m in HttpMethod::SUPPORTED {
            assert_eq!(annotations_for_method(m).open_world_hint, Some(true));
        }
    }

    #[test]
    fn annotations_get_is_readonly_and_idempotent() {
        let a = annotations_for_method(HttpMethod::Get);
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
    }

    #[test]
    fn annotations_patch_leaves_idempotence_unknown() {
        let a = annotations_for_method(HttpMethod::Patch);
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.destructive_hint, Some(true));
        assert_eq!(a.idempotent_hint, None);
    }

    #[test]
    fn delete_is_destructive_but_idempotent() {
        let a = annotations_for_method(HttpMethod::Delete);
        assert_eq!(a.destructive_hint, Some(true));
        assert_eq!(a.idempotent_hint, Some(true));
    }

    #[test]
    fn management_tool_is_closed_world() {
        let a = management_annotations();
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.open_world_hint, Some(false));
    }
}
