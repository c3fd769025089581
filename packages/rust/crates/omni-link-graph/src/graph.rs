//! In-memory link graph owned by the caller and mutated through `upsert`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::identity::NodeId;

/// Ranking depth assigned by a later pass.
///
/// `Unranked` sorts after every `Ranked` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLevel {
    /// Assigned level.
    Ranked(u32),
    /// Not ranked yet.
    #[default]
    Unranked,
}

impl NodeLevel {
    /// Numeric placeholder used by consumers that expect a plain number.
    pub const SENTINEL: u32 = 10_000_000;

    /// Level as a plain number, `SENTINEL` when unranked.
    #[must_use]
    pub const fn as_legacy_value(self) -> u32 {
        match self {
            Self::Ranked(level) => level,
            Self::Unranked => Self::SENTINEL,
        }
    }

    /// Whether a ranking pass has assigned this level.
    #[must_use]
    pub const fn is_ranked(self) -> bool {
        matches!(self, Self::Ranked(_))
    }
}

impl Ord for NodeLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Ranked(a), Self::Ranked(b)) => a.cmp(b),
            (Self::Ranked(_), Self::Unranked) => Ordering::Less,
            (Self::Unranked, Self::Ranked(_)) => Ordering::Greater,
            (Self::Unranked, Self::Unranked) => Ordering::Equal,
        }
    }
}

impl PartialOrd for NodeLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One note in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGraphNode {
    /// Canonical identity derived from `path`.
    pub id: NodeId,
    /// Absolute normalized path of the note.
    pub path: String,
    /// Display title.
    pub label: String,
    /// Outgoing links, deduplicated, in first-occurrence order.
    pub links: Vec<NodeId>,
    /// Incoming links; owned by a separate pass.
    pub backlinks: Vec<NodeId>,
    /// Ranking level; owned by a separate pass.
    pub level: NodeLevel,
}

/// Result of one successful document build, ready to be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUpdate {
    /// Identity of the note.
    pub id: NodeId,
    /// Normalized path of the note.
    pub path: String,
    /// Resolved label.
    pub label: String,
    /// Resolved, deduplicated outgoing links.
    pub links: Vec<NodeId>,
}

/// How `upsert` changed the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new node was created.
    Inserted,
    /// An existing node got a new label and link list.
    Updated,
}

/// Link graph keyed by [`NodeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGraph {
    nodes: HashMap<NodeId, LinkGraphNode>,
}

impl LinkGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by identity.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&LinkGraphNode> {
        self.nodes.get(id)
    }

    /// Whether a node exists.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, in arbitrary order.
    pub fn nodes(&self) -> impl Iterator<Item = &LinkGraphNode> {
        self.nodes.values()
    }

    /// All identities, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&NodeId> {
        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();
        ids
    }

    /// Merge a freshly built note.
    ///
    /// An existing node keeps its `path`, `backlinks` and `level`; only
    /// `label` and `links` are replaced (links wholesale, stale ones vanish).
    /// A new node starts with no backlinks and [`NodeLevel::Unranked`].
    pub fn upsert(&mut self, update: NodeUpdate) -> UpsertOutcome {
        if let Some(node) = self.nodes.get_mut(&update.id) {
            node.label = update.label;
            node.links = update.links;
            return UpsertOutcome::Updated;
        }
        let node = LinkGraphNode {
            id: update.id.clone(),
            path: update.path,
            label: update.label,
            links: update.links,
            backlinks: Vec::new(),
            level: NodeLevel::Unranked,
        };
        self.nodes.insert(update.id, node);
        UpsertOutcome::Inserted
    }

    /// Record incoming links computed by a backlink pass.
    ///
    /// Returns `false` when the node does not exist.
    pub fn set_backlinks(&mut self, id: &NodeId, backlinks: Vec<NodeId>) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.backlinks = backlinks;
                true
            }
            None => false,
        }
    }

    /// Record the level computed by a ranking pass.
    ///
    /// Returns `false` when the node does not exist.
    pub fn set_level(&mut self, id: &NodeId, level: NodeLevel) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.level = level;
                true
            }
            None => false,
        }
    }

    /// Nodes ordered by level, unranked last, ties broken by identity.
    #[must_use]
    pub fn nodes_by_level(&self) -> Vec<&LinkGraphNode> {
        let mut nodes: Vec<&LinkGraphNode> = self.nodes.values().collect();
        nodes.sort_by(|left, right| left.level.cmp(&right.level).then(left.id.cmp(&right.id)));
        nodes
    }

    /// JSON snapshot of all nodes sorted by identity, for rendering layers.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut nodes: Vec<&LinkGraphNode> = self.nodes.values().collect();
        nodes.sort_by(|left, right| left.id.cmp(&right.id));
        serde_json::to_string_pretty(&nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityResolver;

    fn update(resolver: &IdentityResolver, path: &str, label: &str, links: &[&str]) -> NodeUpdate {
        NodeUpdate {
            id: resolver.identity(path),
            path: path.to_string(),
            label: label.to_string(),
            links: links.iter().map(|link| resolver.identity(link)).collect(),
        }
    }

    #[test]
    fn test_upsert_inserts_with_unranked_level() {
        let resolver = IdentityResolver::default();
        let mut graph = LinkGraph::new();
        let outcome = graph.upsert(update(&resolver, "/v/a.md", "A", &["/v/b"]));
        assert_eq!(outcome, UpsertOutcome::Inserted);
        let Some(node) = graph.get(&resolver.identity("/v/a.md")) else {
            panic!("node missing");
        };
        assert!(node.backlinks.is_empty());
        assert_eq!(node.level, NodeLevel::Unranked);
        assert_eq!(node.level.as_legacy_value(), NodeLevel::SENTINEL);
    }

    #[test]
    fn test_upsert_keeps_path_backlinks_and_level() {
        let resolver = IdentityResolver::default();
        let mut graph = LinkGraph::new();
        graph.upsert(update(&resolver, "/v/a.md", "A", &["/v/b", "/v/c"]));
        let id = resolver.identity("/v/a.md");
        assert!(graph.set_backlinks(&id, vec![resolver.identity("/v/z")]));
        assert!(graph.set_level(&id, NodeLevel::Ranked(2)));

        let outcome = graph.upsert(update(&resolver, "/v/./A.md", "A2", &["/v/c"]));
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(graph.len(), 1);
        let Some(node) = graph.get(&id) else {
            panic!("node missing");
        };
        assert_eq!(node.path, "/v/a.md");
        assert_eq!(node.label, "A2");
        assert_eq!(node.links, vec![resolver.identity("/v/c")]);
        assert_eq!(node.backlinks, vec![resolver.identity("/v/z")]);
        assert_eq!(node.level, NodeLevel::Ranked(2));
    }

    #[test]
    fn test_unranked_sorts_last() {
        assert!(NodeLevel::Ranked(u32::MAX) < NodeLevel::Unranked);
        assert!(NodeLevel::Ranked(1) < NodeLevel::Ranked(2));

        let resolver = IdentityResolver::default();
        let mut graph = LinkGraph::new();
        graph.upsert(update(&resolver, "/v/a.md", "A", &[]));
        graph.upsert(update(&resolver, "/v/b.md", "B", &[]));
        graph.set_level(&resolver.identity("/v/b.md"), NodeLevel::Ranked(0));
        let labels: Vec<&str> = graph
            .nodes_by_level()
            .iter()
            .map(|node| node.label.as_str())
            .collect();
        assert_eq!(labels, vec!["B", "A"]);
    }

    #[test]
    fn test_set_level_on_missing_node() {
        let mut graph = LinkGraph::new();
        let resolver = IdentityResolver::default();
        assert!(!graph.set_level(&resolver.identity("/nope"), NodeLevel::Ranked(1)));
    }
}
