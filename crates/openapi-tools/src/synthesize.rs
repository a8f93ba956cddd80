//! Tool synthesis: one MCP tool per extracted operation.

use crate::extract::{Operation, ParamLocation};
use crate::ids::ToolName;
use crate::semantics::annotations_for_method;
use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// Argument carrying the whole request payload.
pub const REQUEST_BODY_ARGUMENT: &str = "requestBody";

/// One entry of a tool's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArgument {
    pub name: String,
    pub schema_type: String,
    pub description: String,
    pub required: bool,
}

/// Arguments exposed for an operation, in schema order.
///
/// Path parameters are always required; query parameters mirror the document. Header and cookie
/// parameters are not exposed. A request body adds one required `requestBody` object.
#[must_use]
pub fn tool_arguments(operation: &Operation) -> Vec<ToolArgument> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut args = Vec::new();

    for p in &operation.parameters {
        let (required, label) = match p.location {
            ParamLocation::Path => (true, "Path parameter"),
            ParamLocation::Query => (p.required, "Query parameter"),
            ParamLocation::Header | ParamLocation::Cookie => continue,
        };
        if !seen.insert(p.name.as_str()) {
            tracing::warn!(
                operation = %operation.operation_id,
                argument = %p.name,
                "duplicate argument name; keeping the first"
            );
            continue;
        }
        args.push(ToolArgument {
            name: p.name.clone(),
            schema_type: p.schema_type.clone().unwrap_or_else(|| "string".to_string()),
            description: p
                .description
                .clone()
                .unwrap_or_else(|| format!("{label}: {}", p.name)),
            required,
        });
    }

    if let Some(body) = &operation.request_body {
        if seen.contains(REQUEST_BODY_ARGUMENT) {
            tracing::warn!(
                operation = %operation.operation_id,
                "parameter named 'requestBody' shadows the request body argument"
            );
        } else {
            args.push(ToolArgument {
                name: REQUEST_BODY_ARGUMENT.to_string(),
                schema_type: "object".to_string(),
                description: body
                    .description
                    .clone()
                    .unwrap_or_else(|| "Request body data".to_string()),
                required: true,
            });
        }
    }

    args
}

/// Build the JSON Schema `inputSchema` for a list of arguments.
#[must_use]
pub fn build_input_schema(arguments: &[ToolArgument]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required: Vec<String> = Vec::new();

    for arg in arguments {
        properties.insert(
            arg.name.clone(),
            json!({
                "type": arg.schema_type,
                "description": arg.description,
            }),
        );
        if arg.required {
            required.push(arg.name.clone());
        }
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });

    if !required.is_empty() {
        schema["required"] = json!(required);
    }

    schema
}

/// `<documentName>: <summary | description | "<METHOD> <path>">`.
#[must_use]
pub fn tool_description(document_name: &str, operation: &Operation) -> String {
    let detail = operation
        .summary
        .clone()
        .or_else(|| operation.description.clone())
        .unwrap_or_else(|| format!("{} {}", operation.method, operation.path));
    format!("{document_name}: {detail}")
}

/// Synthesize the MCP tool for one operation. Deterministic and side-effect free
/// (apart from duplicate-argument warnings).
#[must_use]
pub fn synthesize_tool(document_id: &str, document_name: &str, operation: &Operation) -> Tool {
    let name = ToolName::new(document_id, &operation.operation_id).to_string();
    let schema = build_input_schema(&tool_arguments(operation));
    let schema_obj = schema.as_object().cloned().unwrap_or_else(JsonObject::new);

    let mut tool = Tool::new(
        name,
        tool_description(document_name, operation),
        Arc::new(schema_obj),
    );
    tool.annotations = Some(annotations_for_method(operation.method));
    tool
}
