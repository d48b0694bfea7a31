//! Hover overlay: which nodes and links stay highlighted under the pointer

use std::collections::BTreeSet;

use notegraph_core::{AdjacencyIndex, GraphLink, NodeId};

/// Read-only highlight set for a hovered node.
///
/// Computed from the adjacency index and never written back to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverOverlay {
    pub node: NodeId,
    highlighted: BTreeSet<NodeId>,
}

impl HoverOverlay {
    pub fn new(index: &AdjacencyIndex, node: &NodeId) -> Self {
        let mut highlighted = index.connected_nodes(node).clone();
        highlighted.insert(node.clone());
        Self {
            node: node.clone(),
            highlighted,
        }
    }

    pub fn highlights(&self, id: &NodeId) -> bool {
        self.highlighted.contains(id)
    }

    /// A link stays lit only when it touches the hovered node. Links between
    /// two highlighted neighbors are dimmed, so the hovered node's own edges
    /// stand out.
    pub fn highlights_link(&self, link: &GraphLink) -> bool {
        link.touches(&self.node)
    }

    pub fn highlighted(&self) -> &BTreeSet<NodeId> {
        &self.highlighted
    }

    /// Opacity for a node: full when highlighted, `dimmed` otherwise.
    pub fn node_opacity(&self, id: &NodeId, dimmed: f64) -> f64 {
        if self.highlights(id) { 1.0 } else { dimmed }
    }

    pub fn link_opacity(&self, link: &GraphLink, dimmed: f64) -> f64 {
        if self.highlights_link(link) { 1.0 } else { dimmed }
    }
}
