//! Error types for the MCP server.
//!
//! Every failure that can reach a tool result is an [`McpError`]. The domain
//! variants each carry a stable code (see [`McpError::code`]) so clients can
//! branch on the failure kind without parsing the message.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, McpError>;

/// Uniform error type for the server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum McpError {
    /// The markdown file path was empty.
    #[error("{0}")]
    InvalidFilePath(String),

    /// The path does not end in a markdown extension.
    #[error("{0}")]
    InvalidFileType(String),

    /// The markdown file does not exist.
    #[error("{0}")]
    FileNotFound(String),

    /// The markdown file exists but could not be read.
    #[error("{0}")]
    FileRead(String),

    /// The markdown file is empty or whitespace only.
    #[error("{0}")]
    EmptyContent(String),

    /// The converter failed or produced no blocks.
    #[error("{0}")]
    Parse(String),

    /// The gateway was constructed without a token.
    #[error("{0}")]
    MissingApiToken(String),

    /// The process configuration has no Notion token.
    #[error("{0}")]
    MissingConfig(String),

    /// Notion returned a page record without properties.
    #[error("{0}")]
    PageNotFound(String),

    /// A Notion API call failed.
    #[error("{0}")]
    NotionApi(String),

    /// The Notion identity check failed.
    #[error("{0}")]
    Connection(String),

    /// Anything not covered by a coded variant.
    #[error("{0}")]
    Other(String),

    /// A required tool argument is missing.
    #[error("Missing required argument: {0}")]
    MissingArg(String),

    /// A tool argument has the wrong shape.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// No tool with this name is registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// No resource with this URI is registered.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

impl McpError {
    /// Stable error code for domain failures.
    ///
    /// Returns `None` for the uncoded fallback and for protocol-level
    /// argument errors, which never reach a tool result.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            McpError::InvalidFilePath(_) => Some("INVALID_FILE_PATH"),
            McpError::InvalidFileType(_) => Some("INVALID_FILE_TYPE"),
            McpError::FileNotFound(_) => Some("FILE_NOT_FOUND"),
            McpError::FileRead(_) => Some("FILE_READ_ERROR"),
            McpError::EmptyContent(_) => Some("EMPTY_CONTENT"),
            McpError::Parse(_) => Some("PARSE_ERROR"),
            McpError::MissingApiToken(_) => Some("MISSING_API_TOKEN"),
            McpError::MissingConfig(_) => Some("MISSING_CONFIG"),
            McpError::PageNotFound(_) => Some("PAGE_NOT_FOUND"),
            McpError::NotionApi(_) => Some("NOTION_API_ERROR"),
            McpError::Connection(_) => Some("CONNECTION_ERROR"),
            McpError::Other(_)
            | McpError::MissingArg(_)
            | McpError::InvalidArg { .. }
            | McpError::UnknownTool(_)
            | McpError::UnknownResource(_) => None,
        }
    }

    /// Whether this error belongs to the protocol layer rather than the
    /// domain. Protocol errors become JSON-RPC errors instead of tool results.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            McpError::MissingArg(_)
                | McpError::InvalidArg { .. }
                | McpError::UnknownTool(_)
                | McpError::UnknownResource(_)
        )
    }
}

impl From<serde_json::Error> for McpError {
    fn from(e: serde_json::Error) -> Self {
        McpError::Other(e.to_string())
    }
}
