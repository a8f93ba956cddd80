//! Local `$ref` resolution over raw JSON documents.
//!
//! Stored documents are kept as `serde_json::Value`, so references are followed with JSON
//! pointers into the same document. Only local refs (`#/...`) are resolved; anything else
//! (file or URL refs) is returned unchanged and treated by callers as an opaque value.

use serde_json::Value;
use std::collections::HashSet;

/// Maximum number of `$ref` hops followed for a single value.
const MAX_REF_DEPTH: usize = 16;

/// Resolves `$ref`s relative to a single root document.
#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    root: &'a Value,
}

impl<'a> RefResolver<'a> {
    #[must_use]
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Follow `$ref` chains starting at `value`.
    ///
    /// Returns the first non-reference value reached. Unresolvable, external, or cyclic
    /// references yield the last value seen (which still carries its `$ref`), so callers can
    /// degrade gracefully instead of failing the whole document.
    #[must_use]
    pub fn resolve(&self, value: &'a Value) -> &'a Value {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cur = value;

        for _ in 0..MAX_REF_DEPTH {
            let Some(reference) = ref_target(cur) else {
                return cur;
            };
            if !seen.insert(reference) {
                tracing::debug!(reference, "cyclic $ref; leaving unresolved");
                return cur;
            }
            let Some(next) = self.lookup(reference) else {
                tracing::debug!(reference, "unresolvable $ref; leaving unresolved");
                return cur;
            };
            cur = next;
        }

        tracing::debug!("$ref chain exceeded depth limit; leaving unresolved");
        cur
    }

    fn lookup(&self, reference: &str) -> Option<&'a Value> {
        let pointer = reference.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(self.root);
        }
        self.root.pointer(pointer)
    }
}

fn ref_target(value: &Value) -> Option<&str> {
    value.as_object()?.get("$ref")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_local_parameter_ref() {
        let doc = json!({
            "components": {"parameters": {"Limit": {"name": "limit", "in": "query"}}},
        });
        let param = json!({"$ref": "#/components/parameters/Limit"});
        let resolver = RefResolver::new(&doc);
        assert_eq!(resolver.resolve(&param)["name"], "limit");
    }

    #[test]
    fn follows_chained_refs() {
        let doc = json!({
            "components": {
                "parameters": {
                    "A": {"$ref": "#/components/parameters/B"},
                    "B": {"name": "b", "in": "path"}
                }
            }
        });
        let param = json!({"$ref": "#/components/parameters/A"});
        assert_eq!(RefResolver::new(&doc).resolve(&param)["name"], "b");
    }

    #[test]
    fn escaped_pointer_segments_are_supported() {
        let doc = json!({"paths": {"/pets/{id}": {"parameters": [{"name": "id", "in": "path"}]}}});
        let item = json!({"$ref": "#/paths/~1pets~1{id}"});
        let resolved = RefResolver::new(&doc).resolve(&item);
        assert_eq!(resolved["parameters"][0]["name"], "id");
    }

    #[test]
    fn cyclic_and_external_refs_are_left_unresolved() {
        let doc = json!({
            "components": {"schemas": {
                "A": {"$ref": "#/components/schemas/B"},
                "B": {"$ref": "#/components/schemas/A"}
            }}
        });
        let cyclic = json!({"$ref": "#/components/schemas/A"});
        let resolved = RefResolver::new(&doc).resolve(&cyclic);
        assert!(resolved.get("$ref").is_some());

        let external = json!({"$ref": "./common.yaml#/Pet"});
        let resolved = RefResolver::new(&doc).resolve(&external);
        assert_eq!(resolved, &external);
    }

    #[test]
    fn plain_values_pass_through() {
        let doc = json!({});
        let v = json!({"name": "x"});
        assert_eq!(RefResolver::new(&doc).resolve(&v), &v);
    }
}
