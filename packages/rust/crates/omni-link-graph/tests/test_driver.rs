//! File iteration driver: discovery, hidden files, execution policies.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use omni_link_graph::{
    CollectingReporter, ComrakParser, DocumentSource, ExecutionPolicy, FileIterationDriver,
    FsDocumentSource, GraphBuilder, IdentityResolver, IterationSummary, LinkGraph,
    LinkGraphError, LinkGraphSettings, NodeId, build_graph,
};

/// In-memory notebook that records every pattern and read it serves.
#[derive(Default)]
struct RecordingSource {
    listing: Vec<PathBuf>,
    files: HashMap<PathBuf, Vec<u8>>,
    patterns: Mutex<Vec<String>>,
    reads: Mutex<Vec<PathBuf>>,
    fail_listing: bool,
}

impl RecordingSource {
    fn with_files(files: &[(&str, &[u8])]) -> Self {
        Self {
            listing: files.iter().map(|(path, _)| PathBuf::from(path)).collect(),
            files: files
                .iter()
                .map(|(path, body)| (PathBuf::from(path), body.to_vec()))
                .collect(),
            ..Self::default()
        }
    }

    fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().map(|reads| reads.clone()).unwrap_or_default()
    }

    fn patterns(&self) -> Vec<String> {
        self.patterns
            .lock()
            .map(|patterns| patterns.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSource for RecordingSource {
    async fn list_candidate_files(&self, pattern: &str) -> Result<Vec<PathBuf>, LinkGraphError> {
        if let Ok(mut patterns) = self.patterns.lock() {
            patterns.push(pattern.to_string());
        }
        if self.fail_listing {
            return Err(LinkGraphError::Discovery {
                pattern: pattern.to_string(),
                message: "host unavailable".to_string(),
            });
        }
        Ok(self.listing.clone())
    }

    async fn read_document(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        if let Ok(mut reads) = self.reads.lock() {
            reads.push(path.to_path_buf());
        }
        tokio::task::yield_now().await;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }
}

type TestBuilder = GraphBuilder<RecordingSource, ComrakParser, CollectingReporter>;

fn builder_for(source: RecordingSource, settings: LinkGraphSettings) -> TestBuilder {
    GraphBuilder::new(source, settings).with_reporter(CollectingReporter::new())
}

fn id(builder: &TestBuilder, path: &str) -> NodeId {
    builder.resolver().identity(path)
}

#[tokio::test]
async fn test_hidden_files_are_never_visited() -> Result<(), Box<dyn std::error::Error>> {
    let source = RecordingSource::with_files(&[
        ("/vault/.notes.md", b"# Hidden\n".as_slice()),
        ("/vault/index.md", b"# Index\n".as_slice()),
    ]);
    let builder = builder_for(source, LinkGraphSettings::default());
    let mut graph = LinkGraph::new();

    let summary = FileIterationDriver::new(ExecutionPolicy::Sequential)
        .for_each_file(&mut graph, &builder)
        .await?;

    assert_eq!(builder.source().reads(), vec![PathBuf::from("/vault/index.md")]);
    assert_eq!(summary.skipped_hidden, 1);
    assert_eq!(summary.visited(), 1);
    assert_eq!(graph.len(), 1);
    assert!(graph.contains(&id(&builder, "/vault/index.md")));
    assert!(builder.reporter().messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_glob_is_built_from_file_types() -> Result<(), Box<dyn std::error::Error>> {
    let settings = LinkGraphSettings {
        file_types: vec!["md".to_string(), "markdown".to_string()],
        ..LinkGraphSettings::default()
    };
    let builder = builder_for(RecordingSource::default(), settings);
    let mut graph = LinkGraph::new();
    FileIterationDriver::default()
        .for_each_file(&mut graph, &builder)
        .await?;

    assert_eq!(builder.source().patterns(), vec!["**/*.{md,markdown}".to_string()]);
    Ok(())
}

async fn run_error_isolation(policy: ExecutionPolicy) -> Result<(), Box<dyn std::error::Error>> {
    let source = RecordingSource::with_files(&[
        ("/vault/x.md", [0xc3, 0x28, b'\n'].as_slice()),
        ("/vault/y.md", b"# Why\n\n[[x]]\n".as_slice()),
    ]);
    let builder = builder_for(source, LinkGraphSettings::default());
    let mut graph = LinkGraph::new();

    let summary = FileIterationDriver::new(policy)
        .for_each_file(&mut graph, &builder)
        .await?;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.inserted, 1);
    assert!(!graph.contains(&id(&builder, "/vault/x.md")));
    let Some(y) = graph.get(&id(&builder, "/vault/y.md")) else {
        panic!("y.md should be built");
    };
    assert_eq!(y.label, "Why");
    assert_eq!(y.links, vec![id(&builder, "/vault/x")]);

    let messages = builder.reporter().messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("/vault/x.md"));
    Ok(())
}

#[tokio::test]
async fn test_error_isolation_sequential() -> Result<(), Box<dyn std::error::Error>> {
    run_error_isolation(ExecutionPolicy::Sequential).await
}

#[tokio::test]
async fn test_error_isolation_concurrent() -> Result<(), Box<dyn std::error::Error>> {
    run_error_isolation(ExecutionPolicy::Concurrent).await
}

#[tokio::test]
async fn test_sequential_reports_in_listing_order() -> Result<(), Box<dyn std::error::Error>> {
    let source = RecordingSource {
        listing: vec![
            PathBuf::from("/vault/c.md"),
            PathBuf::from("/vault/a.md"),
            PathBuf::from("/vault/b.md"),
        ],
        ..RecordingSource::default()
    };
    let builder = builder_for(source, LinkGraphSettings::default());
    let mut graph = LinkGraph::new();

    let summary = FileIterationDriver::new(ExecutionPolicy::Sequential)
        .for_each_file(&mut graph, &builder)
        .await?;

    assert_eq!(summary.failed, 3);
    assert!(graph.is_empty());
    let messages = builder.reporter().messages();
    let order: Vec<bool> = ["c.md", "a.md", "b.md"]
        .iter()
        .zip(&messages)
        .map(|(name, message)| message.contains(name))
        .collect();
    assert_eq!(order, vec![true, true, true]);
    Ok(())
}

#[tokio::test]
async fn test_discovery_failure_is_returned() {
    let source = RecordingSource {
        fail_listing: true,
        ..RecordingSource::default()
    };
    let builder = builder_for(source, LinkGraphSettings::default());
    let mut graph = LinkGraph::new();

    let result = FileIterationDriver::default()
        .for_each_file(&mut graph, &builder)
        .await;

    assert!(matches!(result, Err(LinkGraphError::Discovery { .. })));
    assert!(builder.source().reads().is_empty());
}

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn link_sets(graph: &LinkGraph) -> HashMap<NodeId, (String, HashSet<NodeId>)> {
    graph
        .nodes()
        .map(|node| {
            (
                node.id.clone(),
                (node.label.clone(), node.links.iter().cloned().collect()),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_policies_agree_on_a_real_notebook() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().canonicalize()?;
    write_file(&root.join("index.md"), "# Home\n\n[[notes/a]] [[notes/b|B]]\n")?;
    write_file(&root.join("notes/a.md"), "# A\n\n[[../index]] [[b]]\n")?;
    write_file(&root.join("notes/b.md"), "no title [[a]] [[missing]]\n")?;
    write_file(&root.join("notes/.draft.md"), "# Draft\n")?;
    write_file(&root.join("readme.txt"), "[[index]]\n")?;

    let mut results = Vec::new();
    for sequential in [true, false] {
        let settings = LinkGraphSettings {
            policy: ExecutionPolicy::from_sequential(sequential),
            ..LinkGraphSettings::default()
        };
        let builder = GraphBuilder::new(FsDocumentSource::new(&root), settings)
            .with_reporter(CollectingReporter::new());
        let (graph, summary) = build_graph(&builder).await?;
        assert_eq!(
            summary,
            IterationSummary {
                candidates: 4,
                skipped_hidden: 1,
                inserted: 3,
                updated: 0,
                failed: 0,
            }
        );
        assert!(builder.reporter().messages().is_empty());
        results.push(link_sets(&graph));
    }
    assert_eq!(results[0], results[1]);

    let resolver = IdentityResolver::default();
    let b_id = resolver.identity(&root.join("notes/b.md").to_string_lossy());
    let Some((label, links)) = results[0].get(&b_id) else {
        panic!("notes/b.md missing from graph");
    };
    assert_eq!(label, "b");
    assert!(links.contains(&resolver.identity(&root.join("notes/missing").to_string_lossy())));
    Ok(())
}

#[tokio::test]
async fn test_second_pass_updates_existing_nodes() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().canonicalize()?;
    write_file(&root.join("a.md"), "# A\n\n[[b]]\n")?;
    write_file(&root.join("b.md"), "# B\n")?;

    let builder = GraphBuilder::new(FsDocumentSource::new(&root), LinkGraphSettings::default())
        .with_reporter(CollectingReporter::new());
    let driver = FileIterationDriver::new(ExecutionPolicy::Sequential);
    let mut graph = LinkGraph::new();
    driver.for_each_file(&mut graph, &builder).await?;

    write_file(&root.join("a.md"), "# A\n\n[[c]]\n")?;
    let summary = driver.for_each_file(&mut graph, &builder).await?;

    assert_eq!(summary.updated, 2);
    assert_eq!(summary.inserted, 0);
    assert_eq!(graph.len(), 2);
    let a_id = builder
        .resolver()
        .identity(&root.join("a.md").to_string_lossy());
    let Some(a) = graph.get(&a_id) else {
        panic!("a.md missing");
    };
    assert_eq!(
        a.links,
        vec![builder.resolver().identity(&root.join("c").to_string_lossy())]
    );
    Ok(())
}
