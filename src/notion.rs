//! Notion gateway.
//!
//! [`NotionApi`] is the raw REST surface (three calls). [`NotionGateway`]
//! sits on top of it and turns every API failure into a coded [`McpError`].

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::convert::Block;
use crate::error::{McpError, Result};

/// Default Notion REST base URL.
pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

/// Notion API version sent with every request.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Title reported for pages without a title property.
pub const UNTITLED: &str = "Untitled";

/// Settings for the HTTP client.
#[derive(Clone)]
pub struct NotionConfig {
    /// Integration token.
    pub api_token: String,
    /// Base URL, without trailing slash.
    pub api_url: String,
    /// Value of the `Notion-Version` header.
    pub notion_version: String,
}

impl NotionConfig {
    /// Config for the public API with the given token.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
        }
    }
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("notion_version", &self.notion_version)
            .finish()
    }
}

/// Failure from a raw Notion API call.
#[derive(Debug, Error)]
pub enum NotionApiError {
    /// Transport or decode failure.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Notion answered with a non-success status.
    #[error("{message} (status {status}, code {code})")]
    Status {
        /// HTTP status
        status: u16,
        /// Notion error code, e.g. `object_not_found`
        code: String,
        /// Notion error message
        message: String,
    },

    /// Failure raised by a non-HTTP implementation.
    #[error("{0}")]
    Other(String),
}

/// The Notion operations this server needs.
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// `GET /pages/{id}`: the raw page record.
    async fn retrieve_page(&self, page_id: &str) -> std::result::Result<JsonValue, NotionApiError>;

    /// `PATCH /blocks/{id}/children` with all `children` in one request.
    async fn append_children(
        &self,
        block_id: &str,
        children: &[Block],
    ) -> std::result::Result<(), NotionApiError>;

    /// `GET /users/me`: identity check for the token.
    async fn users_me(&self) -> std::result::Result<JsonValue, NotionApiError>;
}

/// reqwest-backed [`NotionApi`].
pub struct HttpNotionApi {
    client: reqwest::Client,
    config: NotionConfig,
}

impl HttpNotionApi {
    /// Build a client for `config`.
    pub fn new(config: NotionConfig) -> std::result::Result<Self, NotionApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("md-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Base URL plus `segments`, each percent-encoded as a single path
    /// segment so ids cannot introduce `/` or `..`.
    fn url(&self, segments: &[&str]) -> std::result::Result<Url, NotionApiError> {
        let invalid =
            || NotionApiError::Other(format!("invalid Notion API URL: {}", self.config.api_url));
        let mut url = Url::parse(&self.config.api_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> std::result::Result<reqwest::RequestBuilder, NotionApiError> {
        Ok(self
            .client
            .request(method, self.url(segments)?)
            .bearer_auth(&self.config.api_token)
            .header("Notion-Version", &self.config.notion_version))
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> std::result::Result<JsonValue, NotionApiError> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "notion response");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Notion error bodies look like {"object":"error","status":404,"code":"...","message":"..."}
        let body: JsonValue = response.json().await.unwrap_or(JsonValue::Null);
        Err(NotionApiError::Status {
            status: status.as_u16(),
            code: body
                .get("code")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            message: body
                .get("message")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| status.to_string()),
        })
    }
}

#[async_trait]
impl NotionApi for HttpNotionApi {
    async fn retrieve_page(&self, page_id: &str) -> std::result::Result<JsonValue, NotionApiError> {
        self.send(self.request(reqwest::Method::GET, &["pages", page_id])?)
            .await
    }

    async fn append_children(
        &self,
        block_id: &str,
        children: &[Block],
    ) -> std::result::Result<(), NotionApiError> {
        let body = serde_json::json!({ "children": children });
        let request = self.request(reqwest::Method::PATCH, &["blocks", block_id, "children"])?;
        self.send(request.json(&body)).await?;
        Ok(())
    }

    async fn users_me(&self) -> std::result::Result<JsonValue, NotionApiError> {
        self.send(self.request(reqwest::Method::GET, &["users", "me"])?)
            .await
    }
}

/// Metadata of a Notion page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Page id
    pub id: String,
    /// Concatenated title, or `Untitled`
    pub title: String,
    /// Public page URL
    pub url: String,
    /// ISO-8601 last edit timestamp
    pub last_edited_time: String,
}

/// Error-normalizing wrapper around a [`NotionApi`].
pub struct NotionGateway {
    api: Box<dyn NotionApi>,
}

impl NotionGateway {
    /// Build a gateway over the HTTP client.
    ///
    /// Fails with `MISSING_API_TOKEN` before any client is built when the
    /// token is empty.
    pub fn new(config: NotionConfig) -> Result<Self> {
        if config.api_token.is_empty() {
            return Err(McpError::MissingApiToken(
                "Notion API token is required".to_string(),
            ));
        }

        let api = HttpNotionApi::new(config)
            .map_err(|e| McpError::Other(format!("Failed to build Notion client: {}", e)))?;
        Ok(Self::with_api(api))
    }

    /// Build a gateway over any API implementation.
    pub fn with_api(api: impl NotionApi + 'static) -> Self {
        Self { api: Box::new(api) }
    }

    /// Append all `blocks` to the page in a single call.
    pub async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<()> {
        tracing::debug!(page_id, blocks = blocks.len(), "appending blocks");
        self.api
            .append_children(page_id, blocks)
            .await
            .map_err(|e| {
                McpError::NotionApi(format!("Failed to append blocks to Notion page: {}", e))
            })
    }

    /// Fetch page metadata. Doubles as an existence check.
    pub async fn get_page_info(&self, page_id: &str) -> Result<PageInfo> {
        let page = self.api.retrieve_page(page_id).await.map_err(|e| {
            McpError::NotionApi(format!("Failed to retrieve Notion page: {}", e))
        })?;

        let Some(properties) = page.get("properties") else {
            return Err(McpError::PageNotFound(
                "Page not found or access denied".to_string(),
            ));
        };

        Ok(PageInfo {
            id: string_field(&page, "id"),
            title: extract_title(properties),
            url: string_field(&page, "url"),
            last_edited_time: string_field(&page, "last_edited_time"),
        })
    }

    /// Check that the token is accepted. Never returns `Ok(false)`.
    pub async fn verify_connection(&self) -> Result<bool> {
        self.api.users_me().await.map_err(|e| {
            McpError::Connection(format!("Failed to verify Notion connection: {}", e))
        })?;
        Ok(true)
    }
}

fn string_field(value: &JsonValue, name: &str) -> String {
    value
        .get(name)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Title of the first property of type `title`, in map iteration order
/// (ascending property name). Fragments are joined without a separator.
pub fn extract_title(properties: &JsonValue) -> String {
    let Some(properties) = properties.as_object() else {
        return UNTITLED.to_string();
    };

    for property in properties.values() {
        if property.get("type").and_then(|t| t.as_str()) != Some("title") {
            continue;
        }
        if let Some(fragments) = property.get("title").and_then(|t| t.as_array()) {
            return fragments
                .iter()
                .filter_map(|f| f.get("plain_text").and_then(|t| t.as_str()))
                .collect();
        }
    }

    UNTITLED.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_title_concatenates_fragments() {
        let props = json!({
            "Name": {
                "type": "title",
                "title": [{ "plain_text": "A" }, { "plain_text": "B" }]
            }
        });
        assert_eq!(extract_title(&props), "AB");
    }

    #[test]
    fn test_extract_title_matches_by_type_not_name() {
        let props = json!({
            "title": { "type": "rich_text", "rich_text": [] },
            "Task": { "type": "title", "title": [{ "plain_text": "Real" }] }
        });
        assert_eq!(extract_title(&props), "Real");
    }

    #[test]
    fn test_extract_title_defaults_to_untitled() {
        let props = json!({ "Status": { "type": "select", "select": null } });
        assert_eq!(extract_title(&props), "Untitled");
        assert_eq!(extract_title(&json!({})), "Untitled");
    }

    #[test]
    fn test_extract_title_empty_fragments() {
        let props = json!({ "Name": { "type": "title", "title": [] } });
        assert_eq!(extract_title(&props), "");
    }

    #[test]
    fn test_new_rejects_empty_token() {
        let err = match NotionGateway::new(NotionConfig::new("")) {
            Err(e) => e,
            Ok(_) => panic!("expected MISSING_API_TOKEN"),
        };
        assert_eq!(err.code(), Some("MISSING_API_TOKEN"));
    }

    #[test]
    fn test_page_id_stays_one_path_segment() {
        let api = HttpNotionApi::new(NotionConfig {
            api_url: "http://localhost:8080/v1/".into(),
            ..NotionConfig::new("secret_test")
        })
        .unwrap();
        let url = api.url(&["pages", "x/../../users/me"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v1/pages/x%2F..%2F..%2Fusers%2Fme"
        );
        let url = api.url(&["blocks", "abc-123", "children"]).unwrap();
        assert_eq!(url.path(), "/v1/blocks/abc-123/children");
    }

    #[test]
    fn test_status_error_display_includes_message() {
        let err = NotionApiError::Status {
            status: 404,
            code: "object_not_found".into(),
            message: "Could not find page".into(),
        };
        assert!(err.to_string().contains("Could not find page"));
    }
}
