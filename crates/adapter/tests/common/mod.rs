use anyhow::Context as _;
use serde_json::{Value, json};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

pub use openapi_mcp_test_support::{EchoServer, KillOnDrop};

pub fn pick_unused_port() -> anyhow::Result<u16> {
    openapi_mcp_test_support::pick_unused_port()
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    openapi_mcp_test_support::wait_http_ok(url, timeout_dur).await
}

pub const ADAPTER_BIN: &str = env!("CARGO_BIN_EXE_openapi-mcp-adapter");

/// Spawn the adapter with stdin held open so the MCP session stays alive.
pub fn spawn_adapter(specs_dir: &Path, admin_port: u16) -> anyhow::Result<Child> {
    Command::new(ADAPTER_BIN)
        .arg("--specs-dir")
        .arg(specs_dir)
        .arg("--admin-bind")
        .arg(format!("127.0.0.1:{admin_port}"))
        .arg("--log-level")
        .arg("info")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .context("spawn adapter")
}

/// Write one stored document file into `dir`.
pub fn write_document(dir: &Path, id: &str, base_url: &str, spec: &Value) -> anyhow::Result<()> {
    let doc = json!({
        "id": id,
        "name": format!("{id} API"),
        "baseUrl": base_url,
        "spec": spec,
        "createdAt": "2024-01-01T00:00:00.000Z",
    });
    std::fs::write(
        dir.join(format!("{id}.json")),
        serde_json::to_vec_pretty(&doc)?,
    )
    .context("write document")
}

pub fn petstore_spec() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "Petstore", "version": "1.0.0"},
        "paths": {
            "/pets/{id}": {
                "get": {
                    "operationId": "getPet",
                    "summary": "Get a pet",
                    "parameters": [{"name": "id", "in": "path", "required": true}]
                }
            },
            "/pets": {
                "post": {
                    "operationId": "createPet",
                    "requestBody": {"required": true}
                }
            }
        }
    })
}
