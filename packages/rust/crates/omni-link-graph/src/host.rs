//! Host capabilities: note discovery, content reads and error surfacing.

use async_trait::async_trait;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;
use std::sync::{Mutex, PoisonError};
use walkdir::{DirEntry, WalkDir};

use crate::error::LinkGraphError;

/// Where notes come from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Candidate note paths matching `pattern` (e.g. `**/*.{md}`).
    ///
    /// # Errors
    ///
    /// Returns [`LinkGraphError::Discovery`] when listing fails.
    async fn list_candidate_files(&self, pattern: &str) -> Result<Vec<PathBuf>, LinkGraphError>;

    /// Raw bytes of one note.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    async fn read_document(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Operator-facing error surface. Must not block or panic.
pub trait ErrorReporter: Send + Sync {
    /// Surface one error message.
    fn report_error(&self, message: &str);
}

/// Decode note bytes as UTF-8.
///
/// # Errors
///
/// Returns the decoding error for invalid UTF-8.
pub fn decode_utf8(bytes: Vec<u8>) -> Result<String, FromUtf8Error> {
    String::from_utf8(bytes)
}

/// Filesystem-backed source rooted at a notebook directory.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    root: PathBuf,
}

impl FsDocumentSource {
    /// Source over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Notebook root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn compile_matcher(pattern: &str) -> Result<GlobMatcher, LinkGraphError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| LinkGraphError::Discovery {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

fn walk_entry(entry: walkdir::Result<DirEntry>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            let location = e
                .path()
                .map_or_else(String::new, |path| format!(" at {}", path.display()));
            log::warn!("Skipping unreadable notebook entry{location}: {e}");
            None
        }
    }
}

fn walk_matching(root: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(walk_entry)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let relative = relative.to_string_lossy().replace('\\', "/");
            matcher.is_match(relative.as_str())
        })
        .map(DirEntry::into_path)
        .collect();
    out.sort();
    out
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn list_candidate_files(&self, pattern: &str) -> Result<Vec<PathBuf>, LinkGraphError> {
        let root = self.root.canonicalize().map_err(|e| LinkGraphError::Discovery {
            pattern: pattern.to_string(),
            message: format!("invalid notebook root '{}': {e}", self.root.display()),
        })?;
        if !root.is_dir() {
            return Err(LinkGraphError::Discovery {
                pattern: pattern.to_string(),
                message: format!("notebook root is not a directory: {}", root.display()),
            });
        }
        let matcher = compile_matcher(pattern)?;
        tokio::task::spawn_blocking(move || walk_matching(&root, &matcher))
            .await
            .map_err(|e| LinkGraphError::Discovery {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    async fn read_document(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Reporter that forwards messages to the `log` facade at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn report_error(&self, message: &str) {
        log::error!("{message}");
    }
}

/// Reporter that keeps every message, for hosts that display them later.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    /// Empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report_error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for &T {
    fn report_error(&self, message: &str) {
        (**self).report_error(message);
    }
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for std::sync::Arc<T> {
    fn report_error(&self, message: &str) {
        (**self).report_error(message);
    }
}
