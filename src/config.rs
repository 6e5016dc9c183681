//! Server configuration.

use serde::Serialize;

use crate::notion::{NotionConfig, DEFAULT_API_URL, DEFAULT_NOTION_VERSION};

/// Server name reported to clients and in the config resource.
pub const SERVER_NAME: &str = "md-mcp";

/// Server version reported to clients and in the config resource.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Process-wide configuration, built once at startup.
#[derive(Clone)]
pub struct Config {
    /// Notion integration token. Absence is reported when a tool first
    /// needs the gateway, not at startup.
    pub notion_token: Option<String>,
    /// Environment name, for reporting only.
    pub environment: String,
    /// Notion REST base URL.
    pub notion_api_url: String,
    /// `Notion-Version` header value.
    pub notion_version: String,
}

impl Config {
    /// Whether a non-empty token is configured.
    pub fn has_notion_token(&self) -> bool {
        self.notion_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Notion client settings, if a token is configured.
    pub fn notion(&self) -> Option<NotionConfig> {
        let token = self.notion_token.as_deref().filter(|t| !t.is_empty())?;
        Some(NotionConfig {
            api_token: token.to_string(),
            api_url: self.notion_api_url.clone(),
            notion_version: self.notion_version.clone(),
        })
    }

    /// Public view of the configuration. Never includes the token.
    pub fn info(&self) -> ConfigInfo {
        ConfigInfo {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
            has_notion_token: self.has_notion_token(),
            environment: self.environment.clone(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("notion_token", &self.notion_token.as_ref().map(|_| "<redacted>"))
            .field("environment", &self.environment)
            .field("notion_api_url", &self.notion_api_url)
            .field("notion_version", &self.notion_version)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notion_token: None,
            environment: "development".to_string(),
            notion_api_url: DEFAULT_API_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
        }
    }
}

/// Body of the `config://current` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
    /// Whether a Notion token is set
    pub has_notion_token: bool,
    /// Environment name
    pub environment: String,
}
