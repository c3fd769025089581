//! Error types for link-graph construction.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use std::string::FromUtf8Error;
use thiserror::Error;

/// Failure raised by a [`DocumentParser`](crate::DocumentParser) when text
/// cannot be turned into a document tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    /// Build a parse error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors produced while building the link graph.
///
/// `Io`, `Decode` and `Parse` are per-document failures: the builder reports
/// them and leaves the graph untouched. `Discovery` and `Config` concern the
/// whole pass.
#[derive(Error, Debug)]
pub enum LinkGraphError {
    /// Document content could not be read.
    #[error("{path}: {source}")]
    Io {
        /// Normalized document path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Document bytes are not valid UTF-8.
    #[error("{path}: {source}")]
    Decode {
        /// Normalized document path.
        path: String,
        /// Underlying decoding failure.
        #[source]
        source: FromUtf8Error,
    },

    /// Document text could not be parsed into a tree.
    #[error("{path}: {source}")]
    Parse {
        /// Normalized document path.
        path: String,
        /// Parser failure.
        #[source]
        source: ParseError,
    },

    /// Candidate files could not be listed.
    #[error("failed to list candidate files for '{pattern}': {message}")]
    Discovery {
        /// Glob pattern handed to the document source.
        pattern: String,
        /// Underlying failure.
        message: String,
    },

    /// Invalid link-graph settings.
    #[error("invalid link_graph config: {0}")]
    Config(String),
}

impl LinkGraphError {
    /// Document path this error is about, for per-document failures.
    #[must_use]
    pub fn document_path(&self) -> Option<&str> {
        match self {
            Self::Io { path, .. } | Self::Decode { path, .. } | Self::Parse { path, .. } => {
                Some(path.as_str())
            }
            Self::Discovery { .. } | Self::Config(_) => None,
        }
    }

    /// Message handed to the operator-facing error reporter.
    #[must_use]
    pub fn report_message(&self) -> String {
        match self {
            Self::Io { path, source } => format!("Error parsing file \"{path}\" - {source}"),
            Self::Decode { path, source } => format!("Error parsing file \"{path}\" - {source}"),
            Self::Parse { path, source } => format!("Error parsing file \"{path}\" - {source}"),
            Self::Discovery { .. } | Self::Config(_) => self.to_string(),
        }
    }
}
