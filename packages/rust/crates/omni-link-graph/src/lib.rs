//! omni-link-graph - Incremental wiki-link graph over markdown notes.
//!
//! Each note becomes one [`LinkGraphNode`] keyed by a path-derived
//! [`NodeId`]: a display label (first `#` heading, else the file stem) and the
//! deduplicated set of notes it links to via `[[wiki links]]`.
//!
//! # Architecture
//!
//! ```text
//! omni-link-graph/src/
//! ├── lib.rs       # Re-exports (this file)
//! ├── error.rs     # LinkGraphError / ParseError
//! ├── identity.rs  # Path normalization + NodeId
//! ├── parser.rs    # DocumentParser capability, comrak backend
//! ├── extract.rs   # Title + raw wiki-link targets
//! ├── graph.rs     # LinkGraph, LinkGraphNode, NodeLevel
//! ├── builder.rs   # GraphBuilder: read → decode → extract → resolve → upsert
//! ├── driver.rs    # FileIterationDriver: discovery + execution policy
//! ├── host.rs      # DocumentSource / ErrorReporter + defaults
//! └── config.rs    # LinkGraphSettings (YAML + env)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_link_graph::{FsDocumentSource, GraphBuilder, LinkGraphSettings, build_graph};
//!
//! let settings = LinkGraphSettings::default().with_env_overrides();
//! let builder = GraphBuilder::new(FsDocumentSource::new("notes"), settings);
//! let (graph, summary) = build_graph(&builder).await?;
//! println!("{} notes, {} failed", graph.len(), summary.failed);
//! ```

mod builder;
mod config;
mod driver;
mod error;
mod extract;
mod graph;
mod host;
mod identity;
mod parser;

pub use builder::GraphBuilder;
pub use config::{ExecutionPolicy, LinkGraphSettings, normalize_file_types};
pub use driver::{FileIterationDriver, IterationSummary, build_graph, file_glob, is_hidden_file};
pub use error::{LinkGraphError, ParseError};
pub use extract::{ExtractedDocument, extract, extract_document};
pub use graph::{LinkGraph, LinkGraphNode, NodeLevel, NodeUpdate, UpsertOutcome};
pub use host::{
    CollectingReporter, DocumentSource, ErrorReporter, FsDocumentSource, LogErrorReporter,
    decode_utf8,
};
pub use identity::{
    IdentityResolver, NodeId, file_stem_label, is_absolute_path, normalize_path, parent_dir,
    resolve_against,
};
pub use parser::{ComrakParser, DocumentParser, DocumentTree, TreeNode, TreeNodeKind};
