//! Serve command: MCP server on stdio.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use rmcp::ServiceExt;
use tracing::{info, instrument};

use salsa_spa_core::Config;

use crate::server::ProjectServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {}

/// Load the grader once and serve MCP requests on stdin/stdout until the
/// client disconnects.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(
    _args: ServeArgs,
    max_input_bytes: Option<usize>,
    config: Config,
) -> anyhow::Result<()> {
    // stdout carries the protocol, so no spinner here.
    let (grader, status) =
        salsa_spa_core::Grader::from_config(&config).context("failed to load grader")?;
    info!(status = ?status, entries = grader.index().len(), "starting MCP server on stdio");

    let server = ProjectServer::new(Arc::new(grader), max_input_bytes);
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await.context("MCP server error")?;

    info!("MCP server stopped");
    Ok(())
}
