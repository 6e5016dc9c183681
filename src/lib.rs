//! # md-mcp
//!
//! MCP (Model Context Protocol) server that appends local markdown files to
//! Notion pages. It implements the MCP protocol over stdin/stdout using
//! JSON-RPC 2.0.
//!
//! ## Tools
//!
//! `md-to-notion`, `verify-notion-connection`
//!
//! ## Resources
//!
//! `config://current`
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "md-mcp": {
//!       "command": "/path/to/md-mcp",
//!       "env": { "NOTION_API_TOKEN": "secret_..." }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use md_mcp::{Config, McpServer, McpSession};
//!
//! # async fn run() -> std::io::Result<()> {
//! let config = Config {
//!     notion_token: std::env::var("NOTION_API_TOKEN").ok(),
//!     ..Config::default()
//! };
//! let server = McpServer::new(McpSession::new(config));
//! server.run().await
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod convert;
mod error;
mod markdown;
mod notion;
mod resources;
mod server;
mod session;
mod tools;

pub use config::{Config, ConfigInfo, SERVER_NAME, SERVER_VERSION};
pub use convert::{Block, BlockConverter, ConvertError, NotionBlockConverter, MAX_TEXT_LENGTH};
pub use error::{McpError, Result};
pub use markdown::{validate_markdown_path, MarkdownIngestor};
pub use notion::{
    extract_title, HttpNotionApi, NotionApi, NotionApiError, NotionConfig, NotionGateway,
    PageInfo, DEFAULT_API_URL, DEFAULT_NOTION_VERSION,
};
pub use resources::{ResourceContents, ResourceDef, CONFIG_URI};
pub use server::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer, PROTOCOL_VERSION};
pub use session::{MarkdownToNotionRequest, McpSession, OperationResult, SUCCESS_MESSAGE};
pub use tools::{ToolContent, ToolDef, ToolRegistry, ToolResult};
