//! Markdown ingestion.
//!
//! Validates markdown file paths, reads the file, and hands the text to a
//! [`BlockConverter`]. Every failure comes back as a coded [`McpError`].

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use crate::convert::{Block, BlockConverter};
use crate::error::{McpError, Result};

/// Recognized markdown file extensions.
pub const MARKDOWN_EXTENSIONS: [&str; 2] = [".md", ".markdown"];

/// Reject empty paths and paths without a markdown extension. No I/O.
pub fn validate_markdown_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(McpError::InvalidFilePath(
            "Markdown file path is required".to_string(),
        ));
    }

    if !MARKDOWN_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return Err(McpError::InvalidFileType(
            "File must be a markdown file (.md or .markdown)".to_string(),
        ));
    }

    Ok(())
}

/// Reads markdown files and converts them to blocks.
#[derive(Clone)]
pub struct MarkdownIngestor {
    converter: Arc<dyn BlockConverter>,
}

impl MarkdownIngestor {
    /// Create an ingestor backed by `converter`.
    pub fn new(converter: Arc<dyn BlockConverter>) -> Self {
        Self { converter }
    }

    /// Read `path` and convert its contents.
    pub async fn parse_file(&self, path: &str) -> Result<Vec<Block>> {
        let content = match tokio::fs::read_to_string(Path::new(path)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(McpError::FileNotFound(format!(
                    "Markdown file not found: {}",
                    path
                )));
            }
            Err(e) => {
                return Err(McpError::FileRead(format!(
                    "Failed to read markdown file: {}",
                    e
                )));
            }
        };

        tracing::debug!(path, bytes = content.len(), "read markdown file");
        self.parse_content(&content)
    }

    /// Convert markdown text. Blocks are returned exactly as the converter
    /// produced them.
    pub fn parse_content(&self, content: &str) -> Result<Vec<Block>> {
        if content.trim().is_empty() {
            return Err(McpError::EmptyContent(
                "Markdown content is empty".to_string(),
            ));
        }

        let blocks = self.converter.convert(content).map_err(|e| {
            McpError::Parse(format!("Failed to parse markdown content: {}", e))
        })?;

        if blocks.is_empty() {
            return Err(McpError::Parse(
                "Failed to parse markdown content".to_string(),
            ));
        }

        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConvertError, NotionBlockConverter};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedConverter {
        result: std::result::Result<Vec<Block>, ConvertError>,
        calls: AtomicUsize,
    }

    impl FixedConverter {
        fn new(result: std::result::Result<Vec<Block>, ConvertError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl BlockConverter for FixedConverter {
        fn convert(&self, _markdown: &str) -> std::result::Result<Vec<Block>, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn paragraph(text: &str) -> Block {
        Block::new(
            "paragraph",
            serde_json::json!({ "rich_text": [{ "type": "text", "text": { "content": text } }] }),
        )
    }

    #[test]
    fn test_validate_accepts_markdown_extensions() {
        assert!(validate_markdown_path("a.md").is_ok());
        assert!(validate_markdown_path("a.markdown").is_ok());
        assert!(validate_markdown_path("/docs/notes.v2.md").is_ok());
    }

    #[test]
    fn test_validate_rejects_other_extensions() {
        for path in ["a.txt", "a", "a.mdx", "a.md.bak", "README.MD"] {
            let err = validate_markdown_path(path).unwrap_err();
            assert_eq!(err.code(), Some("INVALID_FILE_TYPE"), "path {}", path);
        }
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let err = validate_markdown_path("").unwrap_err();
        assert_eq!(err.code(), Some("INVALID_FILE_PATH"));
    }

    #[test]
    fn test_parse_content_rejects_blank_text() {
        let converter = FixedConverter::new(Ok(vec![paragraph("x")]));
        let ingestor = MarkdownIngestor::new(converter.clone());
        for text in ["", "   ", "\n\t\n"] {
            let err = ingestor.parse_content(text).unwrap_err();
            assert_eq!(err.code(), Some("EMPTY_CONTENT"));
        }
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_content_empty_result_is_parse_error() {
        let ingestor = MarkdownIngestor::new(FixedConverter::new(Ok(vec![])));
        let err = ingestor.parse_content("# Hello").unwrap_err();
        assert_eq!(err, McpError::Parse("Failed to parse markdown content".into()));
    }

    #[test]
    fn test_parse_content_wraps_converter_failure() {
        let ingestor = MarkdownIngestor::new(FixedConverter::new(Err(ConvertError::Other(
            "bad table".into(),
        ))));
        let err = ingestor.parse_content("# Hello").unwrap_err();
        assert_eq!(err.code(), Some("PARSE_ERROR"));
        assert!(err.to_string().contains("bad table"));
    }

    #[test]
    fn test_parse_content_passes_blocks_through() {
        let blocks = vec![paragraph("a"), paragraph("b")];
        let ingestor = MarkdownIngestor::new(FixedConverter::new(Ok(blocks.clone())));
        assert_eq!(ingestor.parse_content("a\n\nb").unwrap(), blocks);
    }

    #[tokio::test]
    async fn test_parse_file_not_found() {
        let ingestor = MarkdownIngestor::new(Arc::new(NotionBlockConverter::new()));
        let err = ingestor
            .parse_file("/definitely/not/here.md")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("FILE_NOT_FOUND"));
        assert!(err.to_string().contains("/definitely/not/here.md"));
    }

    #[tokio::test]
    async fn test_parse_file_invalid_utf8_is_read_error() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        let ingestor = MarkdownIngestor::new(Arc::new(NotionBlockConverter::new()));
        let err = ingestor
            .parse_file(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("FILE_READ_ERROR"));
    }

    #[tokio::test]
    async fn test_parse_file_empty_content_keeps_code() {
        let file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        let ingestor = MarkdownIngestor::new(Arc::new(NotionBlockConverter::new()));
        let err = ingestor
            .parse_file(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("EMPTY_CONTENT"));
    }

    #[tokio::test]
    async fn test_parse_file_converts() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        writeln!(file, "# Hello\n\nWorld").unwrap();
        let ingestor = MarkdownIngestor::new(Arc::new(NotionBlockConverter::new()));
        let blocks = ingestor
            .parse_file(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind(), Some("heading_1"));
    }
}
