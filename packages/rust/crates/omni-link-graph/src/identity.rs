//! Path normalization and node identity derivation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a note, derived from its normalized path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Canonical key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub(crate) fn normalize_slashes(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// Split a slash-normalized path into its root prefix (`/`, `C:/`, `C:` or
/// empty) and the remainder.
fn split_root(path: &str) -> (&str, &str) {
    if let Some(rest) = path.strip_prefix('/') {
        return ("/", rest);
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.get(2) == Some(&b'/') {
            return (&path[..3], &path[3..]);
        }
        return (&path[..2], &path[2..]);
    }
    ("", path)
}

/// Lexically normalize a path.
///
/// Backslashes become `/`, repeated separators collapse, `.` segments are
/// dropped and `..` consumes the preceding segment. `..` above an absolute
/// root is discarded; leading `..` of a relative path is kept. No filesystem
/// access happens, so symlinks are not resolved.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let unified = normalize_slashes(raw);
    let (prefix, rest) = split_root(&unified);
    let rooted = prefix.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if prefix.is_empty() && joined.is_empty() {
        return ".".to_string();
    }
    format!("{prefix}{joined}")
}

/// Whether a raw path is absolute (`/...` or drive-rooted `C:/...`).
#[must_use]
pub fn is_absolute_path(raw: &str) -> bool {
    let unified = normalize_slashes(raw);
    split_root(&unified).0.ends_with('/')
}

/// Containing directory of a normalized path (`/` for root-level files,
/// `.` for bare relative names).
#[must_use]
pub fn parent_dir(normalized: &str) -> &str {
    match normalized.rfind('/') {
        Some(0) => "/",
        Some(idx) if normalized[..idx].ends_with(':') => &normalized[..=idx],
        Some(idx) => &normalized[..idx],
        None => ".",
    }
}

/// Resolve `target` against a base directory, or on its own when absolute.
#[must_use]
pub fn resolve_against(base_dir: &str, target: &str) -> String {
    if is_absolute_path(target) {
        normalize_path(target)
    } else {
        normalize_path(&format!("{base_dir}/{target}"))
    }
}

/// Base name of a normalized path without its final extension.
///
/// Dot-files such as `.md` keep their full name.
#[must_use]
pub fn file_stem_label(normalized: &str) -> String {
    let basename = normalized.rsplit('/').next().unwrap_or(normalized);
    match basename.rfind('.') {
        Some(idx) if idx > 0 => basename[..idx].to_string(),
        _ => basename.to_string(),
    }
}

/// Maps paths to node identities.
///
/// The identity is the normalized path, lowercased, with one trailing
/// recognized note suffix removed. `[[b]]`, `[[B.md]]` and `b.md` therefore
/// collapse onto one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    extensions: Vec<String>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(&["md".to_string()])
    }
}

impl IdentityResolver {
    /// Build a resolver for the given file-type suffixes (`md`, `.markdown`, ...).
    #[must_use]
    pub fn new(file_types: &[String]) -> Self {
        let mut extensions: Vec<String> = file_types
            .iter()
            .map(|raw| raw.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{ext}"))
            .collect();
        // Longest first: `.tar.md` must be tried before `.md`.
        extensions.sort_by(|left, right| right.len().cmp(&left.len()).then(left.cmp(right)));
        extensions.dedup();
        Self { extensions }
    }

    /// Identity for a path. Total and deterministic for any input.
    #[must_use]
    pub fn identity(&self, path: &str) -> NodeId {
        let mut key = normalize_path(path).to_lowercase();
        let stem_len = self.extensions.iter().find_map(|ext| {
            key.strip_suffix(ext.as_str())
                .filter(|stem| !stem.is_empty() && !stem.ends_with('/'))
                .map(str::len)
        });
        if let Some(len) = stem_len {
            key.truncate(len);
        }
        NodeId(key)
    }
}
