//! Graph diff between consecutive rebuilds

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::model::NodeId;

/// What changed between two builds of the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GraphDiff {
    /// Monotonically increasing rebuild sequence number.
    pub sequence: u64,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    /// Nodes present in both builds; their layout positions carry over.
    pub retained_nodes: Vec<NodeId>,
    /// Retained nodes whose name, tags or timestamp changed.
    pub modified_nodes: Vec<NodeId>,
    pub added_links: Vec<(NodeId, NodeId)>,
    pub removed_links: Vec<(NodeId, NodeId)>,
}

impl GraphDiff {
    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.modified_nodes.is_empty()
            && self.added_links.is_empty()
            && self.removed_links.is_empty()
    }
}

/// Numbers successive diffs.
#[derive(Debug, Default)]
pub struct DiffEngine {
    sequence: u64,
}

impl DiffEngine {
    pub fn new() -> Self {
        DiffEngine { sequence: 0 }
    }

    /// Compute the difference between two graph builds.
    pub fn compute_diff(&mut self, old_graph: &Graph, new_graph: &Graph) -> GraphDiff {
        self.sequence += 1;
        let mut diff = GraphDiff {
            sequence: self.sequence,
            ..GraphDiff::default()
        };

        for node in new_graph.nodes() {
            match old_graph.node(&node.id) {
                None => diff.added_nodes.push(node.id.clone()),
                Some(old) => {
                    if old.name != node.name || old.tags != node.tags || old.updated_at != node.updated_at {
                        diff.modified_nodes.push(node.id.clone());
                    }
                    diff.retained_nodes.push(node.id.clone());
                }
            }
        }
        for node in old_graph.nodes() {
            if !new_graph.contains(&node.id) {
                diff.removed_nodes.push(node.id.clone());
            }
        }

        let old_links: BTreeSet<(NodeId, NodeId)> = old_graph.links().map(|l| l.key()).collect();
        let new_links: BTreeSet<(NodeId, NodeId)> = new_graph.links().map(|l| l.key()).collect();
        diff.added_links = new_links.difference(&old_links).cloned().collect();
        diff.removed_links = old_links.difference(&new_links).cloned().collect();

        diff
    }

    /// Get current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
