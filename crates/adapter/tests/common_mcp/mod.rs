use anyhow::Context as _;
use serde_json::{Value, json};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Minimal MCP client speaking newline-delimited JSON-RPC to the adapter's stdio.
///
/// Test-only; production code never hand-rolls MCP messages.
pub struct McpStdioSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl McpStdioSession {
    pub async fn spawn(bin: &str, specs_dir: &Path, extra_args: &[String]) -> anyhow::Result<Self> {
        let mut child = Command::new(bin)
            .arg("--specs-dir")
            .arg(specs_dir)
            .args(extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("spawn adapter")?;

        let stdin = child.stdin.take().context("adapter stdin")?;
        let stdout = child.stdout.take().context("adapter stdout")?;

        let mut session = Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "openapi-mcp-adapter-integration-tests", "version": "0" }
                }),
                Duration::from_secs(10),
            )
            .await?;
        anyhow::ensure!(
            init.pointer("/result/capabilities/tools").is_some(),
            "initialize result does not advertise tools: {init}"
        );

        session
            .send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;
        Ok(session)
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let stdin = self.stdin.as_mut().context("stdin already closed")?;
        let mut line = serde_json::to_vec(msg)?;
        line.push(b'\n');
        stdin.write_all(&line).await?;
        stdin.flush().await?;
        Ok(())
    }

    pub async fn request(
        &mut self,
        id: u64,
        method: &str,
        params: Value,
        timeout_dur: Duration,
    ) -> anyhow::Result<Value> {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        tokio::time::timeout(timeout_dur, async {
            loop {
                let line = self
                    .stdout
                    .next_line()
                    .await?
                    .context("adapter closed stdout")?;
                let msg: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                if msg.get("id") == Some(&json!(id)) {
                    return Ok::<Value, anyhow::Error>(msg);
                }
            }
        })
        .await
        .context("timeout waiting for JSON-RPC response")?
    }

    pub async fn call_tool(&mut self, id: u64, name: &str, arguments: Value) -> anyhow::Result<Value> {
        let msg = self
            .request(
                id,
                "tools/call",
                json!({"name": name, "arguments": arguments}),
                Duration::from_secs(20),
            )
            .await?;
        msg.get("result")
            .cloned()
            .context("tools/call missing result")
    }

    pub async fn tool_names(&mut self, id: u64) -> anyhow::Result<Vec<String>> {
        let msg = self
            .request(id, "tools/list", json!({}), Duration::from_secs(10))
            .await?;
        let tools = msg
            .pointer("/result/tools")
            .and_then(Value::as_array)
            .context("tools/list missing result.tools")?;
        Ok(tools
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    /// Close stdin and wait for the adapter to exit on its own.
    pub async fn shutdown(mut self, timeout_dur: Duration) -> anyhow::Result<std::process::ExitStatus> {
        drop(self.stdin.take());
        tokio::time::timeout(timeout_dur, self.child.wait())
            .await
            .context("adapter did not exit after stdin EOF")?
            .context("wait for adapter")
    }
}

/// Text of the first content item of a `tools/call` result.
pub fn result_text(result: &Value) -> anyhow::Result<&str> {
    result
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .context("tools/call missing result.content[0].text")
}
