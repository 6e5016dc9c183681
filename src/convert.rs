//! Conversion utilities.
//!
//! Markdown text is converted into Notion block JSON through the
//! [`BlockConverter`] trait. The default implementation,
//! [`NotionBlockConverter`], walks the `pulldown-cmark` event stream and
//! builds blocks with a frame stack. The rest of the server treats blocks as
//! opaque JSON objects.
//!
//! Also holds the helpers that pull typed tool arguments out of a JSON map.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::error::{McpError, Result};

/// Maximum length of a single rich-text `content` string accepted by Notion.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// An opaque Notion block.
///
/// The server never inspects blocks beyond counting them; they are passed
/// through to the append call as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(Map<String, JsonValue>);

impl Block {
    /// Build a block of the given Notion type with its type-specific body.
    pub fn new(kind: &str, body: JsonValue) -> Self {
        let mut map = Map::new();
        map.insert("object".to_string(), JsonValue::from("block"));
        map.insert("type".to_string(), JsonValue::from(kind));
        map.insert(kind.to_string(), body);
        Self(map)
    }

    /// Notion block type, e.g. `paragraph`.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(|v| v.as_str())
    }

    /// Type-specific body of the block.
    pub fn body(&self) -> Option<&JsonValue> {
        self.kind().and_then(|k| self.0.get(k))
    }

    /// Borrow the raw JSON fields.
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }
}

impl From<Map<String, JsonValue>> for Block {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// Failure raised by a [`BlockConverter`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The event stream closed a tag that was never opened.
    #[error("unbalanced markdown structure")]
    Unbalanced,

    /// Any other converter failure.
    #[error("{0}")]
    Other(String),
}

/// Converts markdown text into an ordered sequence of Notion blocks.
pub trait BlockConverter: Send + Sync {
    /// Convert `markdown` into blocks. An empty result is allowed here; the
    /// ingestor decides whether that is an error.
    fn convert(&self, markdown: &str) -> std::result::Result<Vec<Block>, ConvertError>;
}

/// CommonMark + GFM to Notion block converter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotionBlockConverter;

impl NotionBlockConverter {
    /// Create a converter.
    pub fn new() -> Self {
        Self
    }
}

impl BlockConverter for NotionBlockConverter {
    fn convert(&self, markdown: &str) -> std::result::Result<Vec<Block>, ConvertError> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut builder = BlockBuilder::default();
        for event in Parser::new_ext(markdown, options) {
            builder.handle(event)?;
        }
        builder.finish()
    }
}

// ── Block builder ────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
struct Style {
    bold: bool,
    italic: bool,
    strikethrough: bool,
    code: bool,
}

#[derive(Debug)]
enum Inline {
    Emphasis,
    Strong,
    Strikethrough,
    // `None` for destinations Notion would reject; the text is kept unlinked.
    Link(Option<String>),
}

#[derive(Debug)]
enum Frame {
    Heading(u8, Vec<JsonValue>),
    Paragraph {
        text: Vec<JsonValue>,
        images: Vec<Block>,
    },
    Quote {
        text: Vec<JsonValue>,
        children: Vec<Block>,
    },
    Code {
        language: String,
        text: String,
    },
    List {
        ordered: bool,
        items: Vec<Block>,
    },
    Item {
        ordered: bool,
        checked: Option<bool>,
        text: Vec<JsonValue>,
        children: Vec<Block>,
    },
    Table {
        width: usize,
        rows: Vec<Vec<Vec<JsonValue>>>,
    },
    Row(Vec<Vec<JsonValue>>),
    Cell(Vec<JsonValue>),
    Image {
        url: String,
        alt: String,
    },
    Inline(Inline),
    // Anything whose content is dropped (raw HTML, footnotes, metadata).
    Skip,
}

#[derive(Debug, Default)]
struct BlockBuilder {
    frames: Vec<Frame>,
    root: Vec<Block>,
}

impl BlockBuilder {
    fn handle(&mut self, event: Event<'_>) -> std::result::Result<(), ConvertError> {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => return self.end(),
            Event::Text(text) => self.push_text(&text, false),
            Event::Code(text) => self.push_text(&text, true),
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),
            Event::Rule => self.emit(Block::new("divider", serde_json::json!({}))),
            Event::TaskListMarker(checked) => {
                if let Some(Frame::Item { checked: slot, .. }) = self
                    .frames
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f, Frame::Item { .. }))
                {
                    *slot = Some(checked);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph {
                text: Vec::new(),
                images: Vec::new(),
            },
            Tag::Heading { level, .. } => Frame::Heading(heading_depth(level), Vec::new()),
            Tag::BlockQuote(_) => Frame::Quote {
                text: Vec::new(),
                children: Vec::new(),
            },
            Tag::CodeBlock(kind) => Frame::Code {
                language: match kind {
                    CodeBlockKind::Fenced(info) => notion_language(&info).to_string(),
                    CodeBlockKind::Indented => "plain text".to_string(),
                },
                text: String::new(),
            },
            Tag::List(start) => Frame::List {
                ordered: start.is_some(),
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                ordered: matches!(self.frames.last(), Some(Frame::List { ordered: true, .. })),
                checked: None,
                text: Vec::new(),
                children: Vec::new(),
            },
            Tag::Table(alignments) => Frame::Table {
                width: alignments.len(),
                rows: Vec::new(),
            },
            Tag::TableHead | Tag::TableRow => Frame::Row(Vec::new()),
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Emphasis => Frame::Inline(Inline::Emphasis),
            Tag::Strong => Frame::Inline(Inline::Strong),
            Tag::Strikethrough => Frame::Inline(Inline::Strikethrough),
            Tag::Link { dest_url, .. } => Frame::Inline(Inline::Link(
                is_absolute_url(&dest_url).then(|| dest_url.to_string()),
            )),
            Tag::Image { dest_url, .. } => Frame::Image {
                url: dest_url.to_string(),
                alt: String::new(),
            },
            _ => Frame::Skip,
        };
        self.frames.push(frame);
    }

    fn end(&mut self) -> std::result::Result<(), ConvertError> {
        let frame = self.frames.pop().ok_or(ConvertError::Unbalanced)?;
        match frame {
            Frame::Heading(depth, text) => {
                let kind = format!("heading_{}", depth);
                self.emit(Block::new(&kind, serde_json::json!({ "rich_text": text })));
            }
            Frame::Paragraph { text, images } => {
                if !text.is_empty() {
                    self.absorb_paragraph(text);
                }
                for image in images {
                    self.emit(image);
                }
            }
            Frame::Quote { text, children } => {
                let mut body = serde_json::json!({ "rich_text": text });
                attach_children(&mut body, children);
                self.emit(Block::new("quote", body));
            }
            Frame::Code { language, text } => {
                let content = text.strip_suffix('\n').unwrap_or(&text);
                self.emit(Block::new(
                    "code",
                    serde_json::json!({
                        "rich_text": rich_text(content, Style::default(), None),
                        "language": language,
                    }),
                ));
            }
            Frame::List { items, .. } => {
                for item in items {
                    self.emit(item);
                }
            }
            Frame::Item {
                ordered,
                checked,
                text,
                children,
            } => {
                let (kind, mut body) = match checked {
                    Some(checked) => (
                        "to_do",
                        serde_json::json!({ "rich_text": text, "checked": checked }),
                    ),
                    None if ordered => ("numbered_list_item", serde_json::json!({ "rich_text": text })),
                    None => ("bulleted_list_item", serde_json::json!({ "rich_text": text })),
                };
                attach_children(&mut body, children);
                let block = Block::new(kind, body);
                match self.frames.last_mut() {
                    Some(Frame::List { items, .. }) => items.push(block),
                    _ => self.emit(block),
                }
            }
            Frame::Table { width, rows } => {
                let children: Vec<Block> = rows
                    .into_iter()
                    .map(|mut cells| {
                        cells.resize_with(width, Vec::new);
                        Block::new("table_row", serde_json::json!({ "cells": cells }))
                    })
                    .collect();
                self.emit(Block::new(
                    "table",
                    serde_json::json!({
                        "table_width": width,
                        "has_column_header": true,
                        "has_row_header": false,
                        "children": children,
                    }),
                ));
            }
            Frame::Row(cells) => {
                if let Some(Frame::Table { rows, .. }) = self.frames.last_mut() {
                    rows.push(cells);
                }
            }
            Frame::Cell(text) => {
                if let Some(Frame::Row(cells)) = self.frames.last_mut() {
                    cells.push(text);
                }
            }
            Frame::Image { url, alt } if !is_absolute_url(&url) => {
                if !alt.is_empty() {
                    let block = Block::new(
                        "paragraph",
                        serde_json::json!({ "rich_text": rich_text(&alt, Style::default(), None) }),
                    );
                    match self.frames.last_mut() {
                        Some(Frame::Paragraph { images, .. }) => images.push(block),
                        _ => self.emit(block),
                    }
                }
            }
            Frame::Image { url, alt } => {
                let mut body = serde_json::json!({
                    "type": "external",
                    "external": { "url": url },
                });
                if !alt.is_empty() {
                    body["caption"] = JsonValue::Array(rich_text(&alt, Style::default(), None));
                }
                let block = Block::new("image", body);
                match self.frames.last_mut() {
                    Some(Frame::Paragraph { images, .. }) => images.push(block),
                    _ => self.emit(block),
                }
            }
            Frame::Inline(_) | Frame::Skip => {}
        }
        Ok(())
    }

    fn finish(self) -> std::result::Result<Vec<Block>, ConvertError> {
        if !self.frames.is_empty() {
            return Err(ConvertError::Unbalanced);
        }
        Ok(self.root)
    }

    /// Current inline style and link target, from every open inline frame.
    fn style(&self) -> (Style, Option<String>) {
        let mut style = Style::default();
        let mut link = None;
        for frame in &self.frames {
            if let Frame::Inline(inline) = frame {
                match inline {
                    Inline::Emphasis => style.italic = true,
                    Inline::Strong => style.bold = true,
                    Inline::Strikethrough => style.strikethrough = true,
                    Inline::Link(url) => link = url.clone(),
                }
            }
        }
        (style, link)
    }

    fn push_text(&mut self, text: &str, code: bool) {
        let (mut style, link) = self.style();
        style.code = code;

        let Some(target) = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| !matches!(f, Frame::Inline(_)))
        else {
            return;
        };

        match target {
            Frame::Code { text: buf, .. } => buf.push_str(text),
            Frame::Image { alt, .. } => alt.push_str(text),
            Frame::Heading(_, rich)
            | Frame::Paragraph { text: rich, .. }
            | Frame::Quote { text: rich, .. }
            | Frame::Item { text: rich, .. }
            | Frame::Cell(rich) => rich.extend(rich_text(text, style, link.as_deref())),
            _ => {}
        }
    }

    /// Loose list items and quotes take a leading paragraph as their own
    /// text; any paragraph after another block becomes a child.
    fn absorb_paragraph(&mut self, text: Vec<JsonValue>) {
        if let Some(
            Frame::Item {
                text: own,
                children,
                ..
            }
            | Frame::Quote {
                text: own,
                children,
            },
        ) = self.frames.last_mut()
        {
            if own.is_empty() && children.is_empty() {
                *own = text;
                return;
            }
        }
        self.emit(Block::new("paragraph", serde_json::json!({ "rich_text": text })));
    }

    /// Append a finished block to the innermost block container.
    fn emit(&mut self, block: Block) {
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::Item { children, .. } | Frame::Quote { children, .. } => {
                    children.push(block);
                    return;
                }
                _ => {}
            }
        }
        self.root.push(block);
    }
}

fn attach_children(body: &mut JsonValue, children: Vec<Block>) {
    if !children.is_empty() {
        body["children"] = serde_json::json!(children);
    }
}

/// Notion only accepts absolute http(s) URLs for links and external images.
fn is_absolute_url(url: &str) -> bool {
    reqwest::Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        _ => 3,
    }
}

/// Build rich-text objects for `text`, split at [`MAX_TEXT_LENGTH`].
fn rich_text(text: &str, style: Style, link: Option<&str>) -> Vec<JsonValue> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_LENGTH)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            let mut text_obj = serde_json::json!({ "content": content });
            if let Some(url) = link {
                text_obj["link"] = serde_json::json!({ "url": url });
            }
            serde_json::json!({
                "type": "text",
                "text": text_obj,
                "annotations": {
                    "bold": style.bold,
                    "italic": style.italic,
                    "strikethrough": style.strikethrough,
                    "underline": false,
                    "code": style.code,
                    "color": "default",
                },
            })
        })
        .collect()
}

/// Map a fence info string to a Notion code language.
fn notion_language(info: &str) -> &'static str {
    let lang = info.split_whitespace().next().unwrap_or("").to_lowercase();
    match lang.as_str() {
        "rust" | "rs" => "rust",
        "python" | "py" => "python",
        "javascript" | "js" | "jsx" => "javascript",
        "typescript" | "ts" | "tsx" => "typescript",
        "shell" | "sh" | "zsh" => "shell",
        "bash" => "bash",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "go" | "golang" => "go",
        "java" => "java",
        "kotlin" | "kt" => "kotlin",
        "swift" => "swift",
        "c" => "c",
        "cpp" | "c++" | "cc" => "c++",
        "csharp" | "cs" | "c#" => "c#",
        "ruby" | "rb" => "ruby",
        "php" => "php",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        "markdown" | "md" => "markdown",
        "diff" => "diff",
        "docker" | "dockerfile" => "docker",
        "xml" => "xml",
        "graphql" => "graphql",
        "lua" => "lua",
        "scala" => "scala",
        "haskell" | "hs" => "haskell",
        "mermaid" => "mermaid",
        _ => "plain text",
    }
}

// ── Tool argument helpers ────────────────────────────────────────────────

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(McpError::MissingArg(name.to_string())),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(McpError::InvalidArg {
            name: name.to_string(),
            reason: "Expected a string".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(md: &str) -> Vec<Block> {
        NotionBlockConverter::new().convert(md).unwrap()
    }

    fn plain(block: &Block) -> String {
        block.body().unwrap()["rich_text"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["text"]["content"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_headings() {
        let blocks = convert("# One\n\n## Two\n\n#### Four");
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind().unwrap()).collect();
        assert_eq!(kinds, vec!["heading_1", "heading_2", "heading_3"]);
        assert_eq!(plain(&blocks[0]), "One");
    }

    #[test]
    fn test_paragraph_annotations() {
        let blocks = convert("plain **bold** *it* `code` [link](https://x.dev)");
        assert_eq!(blocks.len(), 1);
        let rich = blocks[0].body().unwrap()["rich_text"].as_array().unwrap();
        let bold = rich.iter().find(|t| t["text"]["content"] == "bold").unwrap();
        assert_eq!(bold["annotations"]["bold"], true);
        let code = rich.iter().find(|t| t["text"]["content"] == "code").unwrap();
        assert_eq!(code["annotations"]["code"], true);
        let link = rich.iter().find(|t| t["text"]["content"] == "link").unwrap();
        assert_eq!(link["text"]["link"]["url"], "https://x.dev");
    }

    #[test]
    fn test_lists_and_nesting() {
        let blocks = convert("- a\n  - nested\n- b\n\n1. first\n2. second\n");
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind().unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                "bulleted_list_item",
                "bulleted_list_item",
                "numbered_list_item",
                "numbered_list_item"
            ]
        );
        let children = blocks[0].body().unwrap()["children"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["type"], "bulleted_list_item");
    }

    #[test]
    fn test_task_list() {
        let blocks = convert("- [x] done\n- [ ] todo\n");
        assert_eq!(blocks[0].kind(), Some("to_do"));
        assert_eq!(blocks[0].body().unwrap()["checked"], true);
        assert_eq!(blocks[1].body().unwrap()["checked"], false);
    }

    #[test]
    fn test_code_block_language() {
        let blocks = convert("```rs\nfn main() {}\n```\n");
        assert_eq!(blocks[0].kind(), Some("code"));
        assert_eq!(blocks[0].body().unwrap()["language"], "rust");
        assert_eq!(plain(&blocks[0]), "fn main() {}");
    }

    #[test]
    fn test_quote_and_divider() {
        let blocks = convert("> quoted\n\n---\n");
        assert_eq!(blocks[0].kind(), Some("quote"));
        assert_eq!(plain(&blocks[0]), "quoted");
        assert_eq!(blocks[1].kind(), Some("divider"));
    }

    #[test]
    fn test_table() {
        let blocks = convert("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(blocks.len(), 1);
        let body = blocks[0].body().unwrap();
        assert_eq!(body["table_width"], 2);
        assert_eq!(body["children"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_image_after_paragraph() {
        let blocks = convert("see ![alt](https://x.dev/a.png)");
        assert_eq!(blocks[0].kind(), Some("paragraph"));
        assert_eq!(blocks[1].kind(), Some("image"));
        assert_eq!(
            blocks[1].body().unwrap()["external"]["url"],
            "https://x.dev/a.png"
        );
    }

    #[test]
    fn test_relative_links_keep_text_without_link() {
        let blocks = convert("See [docs](./docs/setup.md), [top](#intro) and [site](https://x.dev).");
        let rich = blocks[0].body().unwrap()["rich_text"].as_array().unwrap();
        let docs = rich.iter().find(|t| t["text"]["content"] == "docs").unwrap();
        assert!(docs["text"].get("link").is_none());
        let top = rich.iter().find(|t| t["text"]["content"] == "top").unwrap();
        assert!(top["text"].get("link").is_none());
        let site = rich.iter().find(|t| t["text"]["content"] == "site").unwrap();
        assert_eq!(site["text"]["link"]["url"], "https://x.dev");
    }

    #[test]
    fn test_relative_image_becomes_alt_text() {
        let blocks = convert("![diagram](img/arch.png)\n\n![](other.png)\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind(), Some("paragraph"));
        assert_eq!(plain(&blocks[0]), "diagram");
        assert!(!serde_json::to_string(&blocks).unwrap().contains("img/arch.png"));
    }

    #[test]
    fn test_quote_keeps_leading_heading_first() {
        let blocks = convert("> # Title\n>\n> body text\n");
        assert_eq!(blocks.len(), 1);
        let body = blocks[0].body().unwrap();
        assert!(body["rich_text"].as_array().unwrap().is_empty());
        let children = body["children"].as_array().unwrap();
        assert_eq!(children[0]["type"], "heading_1");
        assert_eq!(children[1]["type"], "paragraph");
    }

    #[test]
    fn test_long_text_is_split() {
        let long = "x".repeat(MAX_TEXT_LENGTH + 10);
        let blocks = convert(&long);
        let rich = blocks[0].body().unwrap()["rich_text"].as_array().unwrap();
        assert_eq!(rich.len(), 2);
        assert_eq!(
            rich[0]["text"]["content"].as_str().unwrap().len(),
            MAX_TEXT_LENGTH
        );
    }

    #[test]
    fn test_whitespace_yields_no_blocks() {
        assert!(convert("   \n\n").is_empty());
    }

    #[test]
    fn test_get_string_arg() {
        let mut args = Map::new();
        args.insert("a".into(), JsonValue::from("v"));
        args.insert("n".into(), JsonValue::from(1));
        assert_eq!(get_string_arg(&args, "a").unwrap(), "v");
        assert!(matches!(
            get_string_arg(&args, "missing"),
            Err(McpError::MissingArg(_))
        ));
        assert!(matches!(
            get_string_arg(&args, "n"),
            Err(McpError::InvalidArg { .. })
        ));
    }
}
