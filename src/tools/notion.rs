//! Markdown-to-Notion tools.
//!
//! - `md-to-notion`              — Append a local markdown file to a Notion page
//! - `verify-notion-connection`  — Check the configured Notion token

use serde_json::{Map, Value as JsonValue};

use crate::convert::get_string_arg;
use crate::error::{McpError, Result};
use crate::schema;
use crate::session::{MarkdownToNotionRequest, McpSession};
use crate::tools::{ToolDef, ToolResult};

/// Get all Notion tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "md-to-notion",
            "Markdown to Notion",
            "Convert markdown file content to Notion page",
            schema!(object {
                required: {
                    "markdownFilePath": string => "Path to the markdown file",
                    "notionPageId": string => "Notion page ID to append content to"
                }
            }),
        ),
        ToolDef::new(
            "verify-notion-connection",
            "Verify Notion Connection",
            "Test connection to Notion API",
            schema!(object {}),
        ),
    ]
}

/// Dispatch a Notion tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<ToolResult> {
    match name {
        "md-to-notion" => dispatch_md_to_notion(session, args).await,
        "verify-notion-connection" => Ok(dispatch_verify(session).await),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

// ── md-to-notion ─────────────────────────────────────────────────────────

async fn dispatch_md_to_notion(
    session: &McpSession,
    args: Map<String, JsonValue>,
) -> Result<ToolResult> {
    let request = MarkdownToNotionRequest {
        markdown_file_path: get_string_arg(&args, "markdownFilePath")?,
        notion_page_id: get_string_arg(&args, "notionPageId")?,
    };

    match session.markdown_to_notion(&request).await {
        Ok(result) => Ok(ToolResult::text(serde_json::to_string_pretty(&result)?)),
        Err(e) => {
            tracing::warn!(code = e.code().unwrap_or("UNCODED"), "md-to-notion failed: {}", e);
            Ok(ToolResult::error(format!("Error: {}", e)))
        }
    }
}

// ── verify-notion-connection ─────────────────────────────────────────────

async fn dispatch_verify(session: &McpSession) -> ToolResult {
    match session.verify_notion_connection().await {
        Ok(connected) => ToolResult::text(format!(
            "Notion connection: {}",
            if connected { "Success" } else { "Failed" }
        )),
        Err(e) => {
            tracing::warn!(
                code = e.code().unwrap_or("UNCODED"),
                "verify-notion-connection failed: {}",
                e
            );
            ToolResult::error(format!("Connection failed: {}", e))
        }
    }
}
