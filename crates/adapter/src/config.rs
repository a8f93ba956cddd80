//! Command-line / environment configuration.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "openapi-mcp-adapter")]
#[command(about = "Expose OpenAPI-described HTTP APIs as MCP tools over stdio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory holding one `<id>.json` document per API.
    #[arg(long, env = "SPECS_DIR", default_value = "./data/specs")]
    pub specs_dir: PathBuf,

    /// Serve the management HTTP API on this address (disabled when unset).
    #[arg(long, env = "ADMIN_BIND")]
    pub admin_bind: Option<SocketAddr>,

    /// Outbound request timeout in seconds (0 disables).
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Rescan the specs directory every N seconds (0 disables).
    #[arg(long, env = "RELOAD_INTERVAL_SECS", default_value_t = 5)]
    pub reload_interval_secs: u64,

    /// Default log filter; `RUST_LOG` takes precedence.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn reload_interval(&self) -> Option<Duration> {
        non_zero_secs(self.reload_interval_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
