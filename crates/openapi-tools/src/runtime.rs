//! Tool source: the MCP-facing façade over the store, synthesizer and dispatcher.
//!
//! `list_tools` re-derives the catalog from the store on every call. `call_tool` never returns an
//! error: failures become a text result `Error: <message>` with `isError: true`.

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::extract::extract_operations;
use crate::ids::LIST_APIS_TOOL;
use crate::semantics::management_annotations;
use crate::store::DocumentStore;
use crate::synthesize::synthesize_tool;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// One row of the `list_apis` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub created_at: String,
    pub operations_count: usize,
}

pub struct OpenApiToolSource {
    store: Arc<dyn DocumentStore>,
    dispatcher: Dispatcher,
}

impl OpenApiToolSource {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// List the MCP `Tool`s: `list_apis` first, then one tool per operation per document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let mut tools = vec![list_apis_tool()];
        let mut names: HashSet<String> = HashSet::new();
        names.insert(LIST_APIS_TOOL.to_string());

        for doc in self.store.list().await? {
            for op in extract_operations(&doc.spec) {
                let tool = synthesize_tool(&doc.id, &doc.name, &op);
                if !names.insert(tool.name.to_string()) {
                    tracing::warn!(
                        document = %doc.id,
                        tool = %tool.name,
                        "duplicate tool name; calls resolve to the first matching operation"
                    );
                }
                tools.push(tool);
            }
        }

        tracing::debug!(count = tools.len(), "listed tools");
        Ok(tools)
    }

    /// Execute a tool call. Never fails; errors are reported in the result.
    pub async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let arguments = arguments.unwrap_or_default();

        let outcome = if name == LIST_APIS_TOOL {
            self.list_apis().await.and_then(|apis| to_pretty(&apis))
        } else {
            self.dispatcher
                .dispatch(name, &arguments)
                .await
                .and_then(|result| to_pretty(&result))
        };

        match outcome {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "tool call failed");
                CallToolResult::error(vec![Content::text(format!("Error: {e}"))])
            }
        }
    }

    /// Summaries of all loaded documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_apis(&self) -> Result<Vec<ApiSummary>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .map(|doc| ApiSummary {
                id: doc.id.clone(),
                name: doc.name.clone(),
                base_url: doc.base_url.clone(),
                created_at: doc.created_at.clone(),
                operations_count: extract_operations(&doc.spec).len(),
            })
            .collect())
    }
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn list_apis_tool() -> Tool {
    let schema = json!({"type": "object", "properties": {}});
    let schema_obj = schema.as_object().cloned().unwrap_or_else(JsonObject::new);
    let mut tool = Tool::new(
        LIST_APIS_TOOL,
        "List all loaded OpenAPI specifications",
        Arc::new(schema_obj),
    );
    tool.annotations = Some(management_annotations());
    tool
}
