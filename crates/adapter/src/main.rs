//! `openapi-mcp-adapter`: serves OpenAPI-described HTTP APIs as MCP tools over stdio.

mod admin;
mod config;
mod mcp;
mod store;

use crate::admin::AdminState;
use crate::config::{Args, LogFormat};
use crate::mcp::AdapterServer;
use crate::store::FileDocumentStore;
use anyhow::Context as _;
use clap::Parser as _;
use openapi_mcp_tools::dispatch::Dispatcher;
use openapi_mcp_tools::runtime::OpenApiToolSource;
use openapi_mcp_tools::store::DocumentStore;
use rmcp::ServiceExt as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let store = Arc::new(
        FileDocumentStore::open(&args.specs_dir)
            .await
            .with_context(|| format!("open specs directory {}", args.specs_dir.display()))?,
    );
    let shared: Arc<dyn DocumentStore> = store.clone();

    let client = reqwest::Client::builder()
        .build()
        .context("build HTTP client")?;
    let dispatcher = Dispatcher::new(Arc::clone(&shared), client, args.request_timeout());
    let source = Arc::new(OpenApiToolSource::new(Arc::clone(&shared), dispatcher));

    let shutdown = CancellationToken::new();
    let mut tasks = tokio::task::JoinSet::new();

    if let Some(addr) = args.admin_bind {
        let state = AdminState {
            store: Arc::clone(&shared),
        };
        let token = shutdown.clone();
        tasks.spawn(async move {
            if let Err(e) = admin::serve(addr, state, token).await {
                tracing::error!(error = %e, "management API stopped");
            }
        });
    }

    if let Some(every) = args.reload_interval() {
        tasks.spawn(reload_loop(Arc::clone(&store), every, shutdown.clone()));
    }

    tracing::info!(
        specs_dir = %store.dir().display(),
        admin = ?args.admin_bind,
        "starting MCP server on stdio"
    );
    let service = AdapterServer::new(source)
        .serve(rmcp::transport::stdio())
        .await
        .context("start MCP stdio server")?;

    tokio::select! {
        res = service.waiting() => match res {
            Ok(reason) => tracing::info!(?reason, "MCP session ended"),
            Err(e) => tracing::warn!(error = %e, "MCP service task failed"),
        },
        () = shutdown_signal() => {}
    }

    shutdown.cancel();
    while tasks.join_next().await.is_some() {}
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(args: &Args) {
    // stdout carries the MCP protocol; logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match args.log_format {
        LogFormat::Text => builder.with_ansi(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn reload_loop(store: Arc<FileDocumentStore>, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    // First tick fires immediately; the store was just loaded.
    ticker.tick().await;
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                if let Err(e) = store.reload().await {
                    tracing::warn!(error = %e, "failed to rescan specs directory");
                }
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
