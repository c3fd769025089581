//! Directory-wide iteration: discover notes, skip hidden files, build each one.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::path::{Path, PathBuf};

use crate::builder::GraphBuilder;
use crate::config::{ExecutionPolicy, normalize_file_types};
use crate::error::LinkGraphError;
use crate::graph::{LinkGraph, UpsertOutcome};
use crate::host::{DocumentSource, ErrorReporter};
use crate::parser::DocumentParser;

/// Glob pattern for the recognized note suffixes, e.g. `**/*.{md,markdown}`.
#[must_use]
pub fn file_glob(file_types: &[String]) -> String {
    let file_types = normalize_file_types(file_types);
    format!("**/*.{{{}}}", file_types.join(","))
}

/// Whether the base name of `path` starts with a dot.
#[must_use]
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Counters for one iteration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationSummary {
    /// Files returned by discovery.
    pub candidates: usize,
    /// Hidden files skipped without a visit.
    pub skipped_hidden: usize,
    /// Notes that created a node.
    pub inserted: usize,
    /// Notes that updated an existing node.
    pub updated: usize,
    /// Notes whose build failed and was reported.
    pub failed: usize,
}

impl IterationSummary {
    fn record(&mut self, result: &Result<UpsertOutcome, LinkGraphError>) {
        match result {
            Ok(UpsertOutcome::Inserted) => self.inserted += 1,
            Ok(UpsertOutcome::Updated) => self.updated += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// Notes actually visited (hidden files excluded).
    #[must_use]
    pub const fn visited(&self) -> usize {
        self.inserted + self.updated + self.failed
    }
}

/// Runs the builder over every discovered note under one execution policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileIterationDriver {
    policy: ExecutionPolicy,
}

impl FileIterationDriver {
    /// Driver with an explicit policy.
    #[must_use]
    pub const fn new(policy: ExecutionPolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    /// Visit every non-hidden candidate note once.
    ///
    /// `Sequential` builds notes one after another in listing order, so
    /// failures are reported in that order. `Concurrent` starts every read at
    /// once and merges each note as soon as its read and parse finish. In both
    /// modes a failing note is reported and the pass moves on.
    ///
    /// # Errors
    ///
    /// Returns [`LinkGraphError::Discovery`] when candidates cannot be listed.
    pub async fn for_each_file<S, P, R>(
        &self,
        graph: &mut LinkGraph,
        builder: &GraphBuilder<S, P, R>,
    ) -> Result<IterationSummary, LinkGraphError>
    where
        S: DocumentSource,
        P: DocumentParser,
        R: ErrorReporter,
    {
        let pattern = file_glob(&builder.settings().file_types);
        let candidates = builder.source().list_candidate_files(&pattern).await?;

        let mut summary = IterationSummary {
            candidates: candidates.len(),
            ..IterationSummary::default()
        };
        let visible: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|path| !is_hidden_file(path))
            .collect();
        summary.skipped_hidden = summary.candidates - visible.len();

        match self.policy {
            ExecutionPolicy::Sequential => {
                for path in &visible {
                    let result = builder.build_one(graph, path).await;
                    summary.record(&result);
                }
            }
            ExecutionPolicy::Concurrent => {
                let mut pending: FuturesUnordered<_> =
                    visible.iter().map(|path| builder.prepare(path)).collect();
                while let Some(prepared) = pending.next().await {
                    let result = match prepared {
                        Ok(update) => Ok(graph.upsert(update)),
                        Err(error) => {
                            builder.report(&error);
                            Err(error)
                        }
                    };
                    summary.record(&result);
                }
            }
        }

        log::info!(
            "link graph pass ({:?}) over '{pattern}': {} candidates, {} hidden, {} inserted, {} updated, {} failed",
            self.policy,
            summary.candidates,
            summary.skipped_hidden,
            summary.inserted,
            summary.updated,
            summary.failed
        );
        Ok(summary)
    }
}

/// Build a fresh graph in one pass, using the policy from the builder settings.
///
/// # Errors
///
/// Returns [`LinkGraphError::Discovery`] when candidates cannot be listed.
pub async fn build_graph<S, P, R>(
    builder: &GraphBuilder<S, P, R>,
) -> Result<(LinkGraph, IterationSummary), LinkGraphError>
where
    S: DocumentSource,
    P: DocumentParser,
    R: ErrorReporter,
{
    let mut graph = LinkGraph::new();
    let driver = FileIterationDriver::new(builder.settings().policy);
    let summary = driver.for_each_file(&mut graph, builder).await?;
    Ok((graph, summary))
}
