//! MCP (Model Context Protocol) server implementation.
//!
//! This module exposes grading over the MCP protocol, making it available to
//! AI assistants via stdio transport.
//!
//! # Architecture
//!
//! The MCP server is a presentation layer. It wraps the same [`Grader`] the
//! CLI commands use, loaded once at startup and shared behind an `Arc`. Each
//! `#[tool]` method delegates to the grader rather than implementing grading
//! logic directly.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use salsa_spa_core::Grader;

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `grade_text` and `word_levels` tools.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct TextParams {
    /// The Spanish text to grade.
    pub text: String,
}

/// MCP server exposing CEFR grading to AI assistants.
///
/// Each `#[tool]` method in the `#[tool_router]` impl block is automatically
/// registered and callable via the MCP protocol.
#[derive(Clone)]
pub struct ProjectServer {
    grader: Arc<Grader>,
    max_input_bytes: Option<usize>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

#[tool_router]
impl ProjectServer {
    /// Create a new MCP server instance around a loaded grader.
    pub fn new(grader: Arc<Grader>, max_input_bytes: Option<usize>) -> Self {
        Self {
            grader,
            max_input_bytes,
            tool_router: Self::tool_router(),
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "vocabulary_entries": self.grader.index().len(),
            "lemmatizer": self.grader.lemmatizer_fingerprint(),
        });

        let text = if params.format == "json" {
            serde_json::to_string_pretty(&info)
                .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?
        } else {
            format!(
                "{} v{}\n{}\n{} vocabulary entries",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
                self.grader.index().len(),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Grade Spanish text on the CEFR scale.
    #[tool(
        description = "Grade Spanish text on the CEFR scale. Returns grade (0-1), predicted level (A0-C2), confidence, level probabilities, word statistics and the expressions found at each level."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn grade_text(
        &self,
        Parameters(params): Parameters<TextParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "grade_text", bytes = params.text.len(), "executing MCP tool");
        self.check_size(&params.text)?;

        let report = self
            .grader
            .grade(&params.text)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(
            tool = "grade_text",
            level = %report.predicted_level,
            grade = report.grade,
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// List the CEFR level of every word and expression in the text.
    #[tool(
        description = "List each word or fixed expression in Spanish text with its CEFR level (null when the word is in no list), in input order."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn word_levels(
        &self,
        Parameters(params): Parameters<TextParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "word_levels", bytes = params.text.len(), "executing MCP tool");
        self.check_size(&params.text)?;

        let words = self
            .grader
            .word_levels(&params.text)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let json = serde_json::to_string_pretty(&words)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(tool = "word_levels", count = words.len(), "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

impl ProjectServer {
    fn check_size(&self, text: &str) -> Result<(), McpError> {
        match self.max_input_bytes {
            Some(max) if text.len() > max => Err(McpError::invalid_params(
                format!("input too large: {} bytes (limit: {max} bytes)", text.len()),
                None,
            )),
            _ => Ok(()),
        }
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use grade_text for an overall CEFR level and word_levels for per-word levels of Spanish text.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}
