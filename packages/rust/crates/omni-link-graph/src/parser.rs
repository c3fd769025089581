//! Markdown tree parsing capability.
//!
//! The extractor only talks to [`DocumentParser`] and the parser-neutral
//! [`DocumentTree`]; [`ComrakParser`] is the default backend.

use comrak::{Arena, Options, nodes::AstNode, nodes::NodeValue, parse_document};
use memchr::memchr;

use crate::error::ParseError;

const FRONT_MATTER_DELIMITER: &str = "---";

/// Node category as seen by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNodeKind {
    /// Document root.
    Document,
    /// Leading metadata block (raw, never scanned).
    FrontMatter(String),
    /// ATX or setext heading.
    Heading {
        /// Heading depth, 1 to 6.
        level: u8,
    },
    /// `[[target]]` or `[[target|alias]]`; children carry the alias text.
    WikiLink {
        /// Link target exactly as authored.
        target: String,
    },
    /// Inline markdown link; children carry the link text.
    Link {
        /// Link destination exactly as authored.
        url: String,
    },
    /// Literal text.
    Text(String),
    /// Inline code span.
    Code(String),
    /// Any other block or inline container.
    Other,
}

/// One node of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Node category.
    pub kind: TreeNodeKind,
    /// Child nodes in document order.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Leaf or container node.
    #[must_use]
    pub fn new(kind: TreeNodeKind, children: Vec<TreeNode>) -> Self {
        Self { kind, children }
    }

    /// Heading depth when this node is a heading.
    #[must_use]
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            TreeNodeKind::Heading { level } => Some(level),
            _ => None,
        }
    }

    /// Whether this node is a heading.
    #[must_use]
    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Raw target when this node is a wiki link.
    #[must_use]
    pub fn wiki_link_target(&self) -> Option<&str> {
        match &self.kind {
            TreeNodeKind::WikiLink { target } => Some(target.as_str()),
            _ => None,
        }
    }

    /// Concatenated literal text of this node's subtree.
    #[must_use]
    pub fn rendered_text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match &self.kind {
            TreeNodeKind::Text(text) | TreeNodeKind::Code(text) => out.push_str(text),
            TreeNodeKind::FrontMatter(_) => {}
            _ => {
                for child in &self.children {
                    child.push_text(out);
                }
            }
        }
    }
}

/// Parsed document: a tree rooted at a [`TreeNodeKind::Document`] node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    /// Root node.
    pub root: TreeNode,
}

impl DocumentTree {
    /// Direct children of the document root.
    #[must_use]
    pub fn blocks(&self) -> &[TreeNode] {
        &self.root.children
    }
}

/// Turns decoded note text into a [`DocumentTree`].
///
/// Implementations must recognize wiki links (alias after `|` is not part of
/// the target) and a leading front-matter block.
pub trait DocumentParser: Send + Sync {
    /// Parse `text` into a document tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the text is not parseable.
    fn parse(&self, text: &str) -> Result<DocumentTree, ParseError>;
}

/// comrak-backed parser with wikilinks and front matter enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComrakParser;

impl ComrakParser {
    /// Create the default parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn options() -> Options<'static> {
        let mut options = Options::default();
        // Obsidian-style `[[url|title]]`.
        options.extension.wikilinks_title_after_pipe = true;
        options.extension.front_matter_delimiter = Some(FRONT_MATTER_DELIMITER.to_string());
        // No GFM tables: the alias pipe in `[[t|x]]` would split the cell.
        options.extension.strikethrough = true;
        options
    }
}

impl DocumentParser for ComrakParser {
    fn parse(&self, text: &str) -> Result<DocumentTree, ParseError> {
        // comrak accepts any input; NUL bytes mean binary content, not a note.
        if let Some(offset) = memchr(0, text.as_bytes()) {
            return Err(ParseError::new(format!(
                "binary content detected (NUL byte at offset {offset})"
            )));
        }
        let options = Self::options();
        let arena = Arena::new();
        let root = parse_document(&arena, text, &options);
        Ok(DocumentTree {
            root: convert_node(root),
        })
    }
}

fn convert_node<'a>(node: &'a AstNode<'a>) -> TreeNode {
    let kind = match &node.data().value {
        NodeValue::Document => TreeNodeKind::Document,
        NodeValue::FrontMatter(raw) => TreeNodeKind::FrontMatter(raw.to_string()),
        NodeValue::Heading(heading) => TreeNodeKind::Heading {
            level: heading.level,
        },
        NodeValue::WikiLink(link) => TreeNodeKind::WikiLink {
            target: link.url.to_string(),
        },
        NodeValue::Link(link) => TreeNodeKind::Link {
            url: link.url.to_string(),
        },
        NodeValue::Text(text) => TreeNodeKind::Text(text.to_string()),
        NodeValue::Code(code) => TreeNodeKind::Code(code.literal.to_string()),
        NodeValue::SoftBreak | NodeValue::LineBreak => TreeNodeKind::Text(" ".to_string()),
        _ => TreeNodeKind::Other,
    };
    let children = node.children().map(convert_node).collect();
    TreeNode::new(kind, children)
}
