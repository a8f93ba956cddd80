//! MCP server handler: `tools/list` and `tools/call` over the tool source.

use openapi_mcp_tools::runtime::OpenApiToolSource;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler};
use std::sync::Arc;

const INSTRUCTIONS: &str = "Each tool calls one operation of a loaded OpenAPI document. \
Tool names are `<apiId>_<operationId>`; call `list_apis` to see the loaded APIs.";

#[derive(Clone)]
pub struct AdapterServer {
    source: Arc<OpenApiToolSource>,
}

impl AdapterServer {
    #[must_use]
    pub fn new(source: Arc<OpenApiToolSource>) -> Self {
        Self { source }
    }
}

impl ServerHandler for AdapterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        // The catalog is re-derived on every listing; documents may change between calls.
        let tools = self
            .source
            .list_tools()
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self
            .source
            .call_tool(&request.name, request.arguments)
            .await)
    }
}
