//! Title and raw link-target extraction from a parsed note.

use crate::error::ParseError;
use crate::parser::{DocumentParser, DocumentTree, TreeNode, TreeNodeKind};

const TITLE_HEADING_LEVEL: u8 = 1;

const NON_LOCAL_SCHEMES: &[&str] = &[
    "http://",
    "https://",
    "mailto:",
    "tel:",
    "data:",
    "javascript:",
];

/// Structural summary of one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Declared title (first top-level `#` heading), if any.
    pub title: Option<String>,
    /// Link targets in document order, unresolved.
    pub raw_links: Vec<String>,
}

fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_title(tree: &DocumentTree) -> Option<String> {
    tree.blocks()
        .iter()
        .filter(|block| block.heading_level() == Some(TITLE_HEADING_LEVEL))
        .map(|heading| normalize_whitespace(&heading.rendered_text()))
        .find(|title| !title.is_empty())
}

/// Strip `<...>` wrappers, link titles, `#fragment` and `?query` from a
/// markdown link destination. Remote and fragment-only targets yield `None`.
fn local_markdown_target(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    // Support [text](<path/to/doc.md>) and [text](path/to/doc.md "title")
    let unwrapped = if let Some(inner) = trimmed.strip_prefix('<') {
        &inner[..inner.find('>')?]
    } else {
        trimmed.split_whitespace().next()?
    };
    if unwrapped.starts_with('#') {
        return None;
    }
    let lower = unwrapped.to_lowercase();
    if NON_LOCAL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }
    let candidate = unwrapped
        .split_once('#')
        .map_or(unwrapped, |(left, _)| left);
    let candidate = candidate.split_once('?').map_or(candidate, |(left, _)| left);
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

fn collect_links(node: &TreeNode, include_markdown_links: bool, out: &mut Vec<String>) {
    match &node.kind {
        TreeNodeKind::FrontMatter(_) => return,
        TreeNodeKind::WikiLink { target } => {
            out.push(target.clone());
            return;
        }
        TreeNodeKind::Link { url } if include_markdown_links => {
            if let Some(target) = local_markdown_target(url) {
                out.push(target);
            }
        }
        _ => {}
    }
    for child in &node.children {
        collect_links(child, include_markdown_links, out);
    }
}

/// Derive the title and raw link targets from a parsed note.
///
/// Wiki links are collected wherever they occur (emphasis, lists, quotes,
/// headings, pipe-table rows). Local markdown links are added only when
/// `include_markdown_links` is set. Front matter is never scanned.
#[must_use]
pub fn extract(tree: &DocumentTree, include_markdown_links: bool) -> ExtractedDocument {
    let mut raw_links = Vec::new();
    collect_links(&tree.root, include_markdown_links, &mut raw_links);
    ExtractedDocument {
        title: find_title(tree),
        raw_links,
    }
}

/// Parse `text` with `parser` and extract its title and links.
///
/// # Errors
///
/// Propagates the parser's [`ParseError`] unchanged.
pub fn extract_document<P: DocumentParser + ?Sized>(
    parser: &P,
    text: &str,
    include_markdown_links: bool,
) -> Result<ExtractedDocument, ParseError> {
    let tree = parser.parse(text)?;
    Ok(extract(&tree, include_markdown_links))
}
