//! Readable MCP resources.
//!
//! Resources: `config://current`

use serde::{Deserialize, Serialize};

use crate::error::{McpError, Result};
use crate::session::McpSession;

/// URI of the configuration resource.
pub const CONFIG_URI: &str = "config://current";

/// A resource definition for the MCP resources/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Resource URI
    pub uri: String,
    /// Resource name
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Resource description
    pub description: String,
    /// MIME type of the contents
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Contents returned by resources/read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContents {
    /// Resource URI
    pub uri: String,
    /// MIME type of `text`
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Resource body
    pub text: String,
}

/// Get all resource definitions.
pub fn resources() -> Vec<ResourceDef> {
    vec![ResourceDef {
        uri: CONFIG_URI.to_string(),
        name: "config-info".to_string(),
        title: "Current Configuration".to_string(),
        description: "Display current server configuration".to_string(),
        mime_type: "application/json".to_string(),
    }]
}

/// Read a resource by URI.
pub fn read(session: &McpSession, uri: &str) -> Result<ResourceContents> {
    match uri {
        CONFIG_URI => Ok(ResourceContents {
            uri: CONFIG_URI.to_string(),
            mime_type: "application/json".to_string(),
            text: serde_json::to_string_pretty(&session.config().info())?,
        }),
        _ => Err(McpError::UnknownResource(uri.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_read_config() {
        let session = McpSession::new(Config {
            notion_token: Some("secret_xyz".into()),
            ..Config::default()
        });
        let contents = read(&session, CONFIG_URI).unwrap();
        let body: serde_json::Value = serde_json::from_str(&contents.text).unwrap();
        assert_eq!(body["name"], "md-mcp");
        assert_eq!(body["hasNotionToken"], true);
        assert_eq!(body["environment"], "development");
        assert!(!contents.text.contains("secret_xyz"));
    }

    #[test]
    fn test_read_unknown() {
        let session = McpSession::new(Config::default());
        assert!(matches!(
            read(&session, "config://other"),
            Err(McpError::UnknownResource(_))
        ));
    }
}
