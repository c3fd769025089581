//! Per-note graph construction: read, decode, extract, resolve, upsert.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::LinkGraphSettings;
use crate::error::LinkGraphError;
use crate::extract::extract_document;
use crate::graph::{LinkGraph, NodeUpdate, UpsertOutcome};
use crate::host::{DocumentSource, ErrorReporter, LogErrorReporter, decode_utf8};
use crate::identity::{
    IdentityResolver, NodeId, file_stem_label, normalize_path, parent_dir, resolve_against,
};
use crate::parser::{ComrakParser, DocumentParser};

/// Drop an Obsidian-style `#heading` / `#^block` suffix from a link target.
fn strip_fragment(target: &str) -> &str {
    target.split_once('#').map_or(target, |(left, _)| left)
}

/// Builds and merges one note at a time into a [`LinkGraph`].
#[derive(Debug)]
pub struct GraphBuilder<S, P = ComrakParser, R = LogErrorReporter> {
    source: S,
    parser: P,
    reporter: R,
    resolver: IdentityResolver,
    settings: LinkGraphSettings,
}

impl<S: DocumentSource> GraphBuilder<S> {
    /// Builder with the comrak parser and log-backed error reporting.
    pub fn new(source: S, settings: LinkGraphSettings) -> Self {
        Self {
            source,
            parser: ComrakParser::new(),
            reporter: LogErrorReporter,
            resolver: IdentityResolver::new(&settings.file_types),
            settings,
        }
    }
}

impl<S, P, R> GraphBuilder<S, P, R>
where
    S: DocumentSource,
    P: DocumentParser,
    R: ErrorReporter,
{
    /// Swap the tree parser.
    pub fn with_parser<P2: DocumentParser>(self, parser: P2) -> GraphBuilder<S, P2, R> {
        GraphBuilder {
            source: self.source,
            parser,
            reporter: self.reporter,
            resolver: self.resolver,
            settings: self.settings,
        }
    }

    /// Swap the error reporter.
    pub fn with_reporter<R2: ErrorReporter>(self, reporter: R2) -> GraphBuilder<S, P, R2> {
        GraphBuilder {
            source: self.source,
            parser: self.parser,
            reporter,
            resolver: self.resolver,
            settings: self.settings,
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &LinkGraphSettings {
        &self.settings
    }

    /// Identity resolver built from the configured file types.
    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Note source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Error reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Resolve raw link targets of the note at `document_path` to identities.
    ///
    /// Absolute targets resolve on their own, relative ones against the
    /// note's directory. Empty targets are skipped; the result is
    /// deduplicated in first-occurrence order.
    pub fn resolve_links(&self, document_path: &str, raw_links: &[String]) -> Vec<NodeId> {
        let base_dir = parent_dir(document_path);
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut out: Vec<NodeId> = Vec::new();
        for raw in raw_links {
            let target = strip_fragment(raw.trim()).trim();
            // Fragment-only targets (`[[#Heading]]`) point inside this note and add no edge.
            if target.is_empty() {
                continue;
            }
            let id = self.resolver.identity(&resolve_against(base_dir, target));
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
        out
    }

    /// Read and analyze one note without touching any graph.
    ///
    /// # Errors
    ///
    /// Returns `Io`, `Decode` or `Parse` errors for the note.
    pub async fn prepare(&self, path: &Path) -> Result<NodeUpdate, LinkGraphError> {
        let normalized = normalize_path(&path.to_string_lossy());
        let bytes = self
            .source
            .read_document(&PathBuf::from(&normalized))
            .await
            .map_err(|source| LinkGraphError::Io {
                path: normalized.clone(),
                source,
            })?;
        let text = decode_utf8(bytes).map_err(|source| LinkGraphError::Decode {
            path: normalized.clone(),
            source,
        })?;
        let extracted =
            extract_document(&self.parser, &text, self.settings.include_markdown_links).map_err(
                |source| LinkGraphError::Parse {
                    path: normalized.clone(),
                    source,
                },
            )?;

        let label = extracted
            .title
            .unwrap_or_else(|| file_stem_label(&normalized));
        let links = self.resolve_links(&normalized, &extracted.raw_links);
        log::debug!(
            "parsed note {normalized}: label={label:?} links={}",
            links.len()
        );
        Ok(NodeUpdate {
            id: self.resolver.identity(&normalized),
            path: normalized,
            label,
            links,
        })
    }

    /// Surface a per-note failure through the reporter.
    pub fn report(&self, error: &LinkGraphError) {
        log::warn!("abandoning note update: {error}");
        self.reporter.report_error(&error.report_message());
    }

    /// Build one note and merge it into `graph`.
    ///
    /// On failure the error is reported, returned, and `graph` is left as it
    /// was; a node from an earlier successful build keeps its previous state.
    ///
    /// # Errors
    ///
    /// Returns `Io`, `Decode` or `Parse` errors for the note.
    pub async fn build_one(
        &self,
        graph: &mut LinkGraph,
        path: &Path,
    ) -> Result<UpsertOutcome, LinkGraphError> {
        match self.prepare(path).await {
            Ok(update) => Ok(graph.upsert(update)),
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        }
    }
}
