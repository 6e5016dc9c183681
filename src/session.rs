//! MCP session management.
//!
//! Holds the process configuration, the markdown ingestor and the lazily
//! built Notion gateway, and sequences them for the convert-and-append
//! operation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::convert::{BlockConverter, NotionBlockConverter};
use crate::error::{McpError, Result};
use crate::markdown::{validate_markdown_path, MarkdownIngestor};
use crate::notion::NotionGateway;

/// Message returned on a successful append.
pub const SUCCESS_MESSAGE: &str = "Markdown content successfully added to Notion page";

/// Input of the `md-to-notion` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownToNotionRequest {
    /// Local markdown file
    pub markdown_file_path: String,
    /// Target page id
    pub notion_page_id: String,
}

/// Outcome of the `md-to-notion` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    /// Always `true` when returned; failures are errors
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    /// URL of the target page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// Number of top-level blocks appended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks_created: Option<usize>,
    /// Title of the target page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
}

/// MCP session state.
///
/// The gateway is built on first use and then kept for the life of the
/// session. `OnceCell` guarantees a single initialization; a failed
/// initialization leaves the cell empty.
pub struct McpSession {
    config: Config,
    ingestor: MarkdownIngestor,
    gateway: OnceCell<NotionGateway>,
}

impl McpSession {
    /// Create a session with the default markdown converter.
    pub fn new(config: Config) -> Self {
        Self::with_converter(config, Arc::new(NotionBlockConverter::new()))
    }

    /// Create a session with a custom markdown converter.
    pub fn with_converter(config: Config, converter: Arc<dyn BlockConverter>) -> Self {
        Self {
            config,
            ingestor: MarkdownIngestor::new(converter),
            gateway: OnceCell::new(),
        }
    }

    /// Use an already-built gateway instead of building one from config.
    pub fn with_gateway(mut self, gateway: NotionGateway) -> Self {
        self.gateway = OnceCell::new_with(Some(gateway));
        self
    }

    /// Process configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the gateway, building it from config on first use.
    pub async fn gateway(&self) -> Result<&NotionGateway> {
        self.gateway
            .get_or_try_init(|| async {
                let notion = self.config.notion().ok_or_else(|| {
                    McpError::MissingConfig(
                        "NOTION_API_TOKEN environment variable is required".to_string(),
                    )
                })?;
                tracing::info!(api_url = %notion.api_url, "initializing Notion gateway");
                NotionGateway::new(notion)
            })
            .await
    }

    /// Convert a markdown file and append it to a Notion page.
    ///
    /// Steps run strictly in order and the first failure aborts the rest.
    /// Nothing is undone when the append fails.
    pub async fn markdown_to_notion(
        &self,
        request: &MarkdownToNotionRequest,
    ) -> Result<OperationResult> {
        let gateway = self.gateway().await?;

        validate_markdown_path(&request.markdown_file_path)?;

        let blocks = self
            .ingestor
            .parse_file(&request.markdown_file_path)
            .await?;

        let page = gateway.get_page_info(&request.notion_page_id).await?;

        gateway
            .append_blocks(&request.notion_page_id, &blocks)
            .await?;

        tracing::info!(
            page_id = %request.notion_page_id,
            blocks = blocks.len(),
            title = %page.title,
            "appended markdown to Notion page"
        );

        Ok(OperationResult {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            page_url: Some(page.url),
            blocks_created: Some(blocks.len()),
            page_title: Some(page.title),
        })
    }

    /// Check the Notion token against the identity endpoint.
    pub async fn verify_notion_connection(&self) -> Result<bool> {
        self.gateway().await?.verify_connection().await
    }
}
