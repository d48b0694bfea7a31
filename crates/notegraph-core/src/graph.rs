//! Graph arena using petgraph::StableDiGraph, addressed by NodeId

use crate::model::*;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// The relationship graph. Nodes are addressed by id; each pair has at most one link.
pub struct Graph {
    inner: StableDiGraph<GraphNode, GraphLink>,
    index: HashMap<NodeId, NodeIndex>,
    version: u64,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("version", &self.version)
            .field("node_count", &self.inner.node_count())
            .field("link_count", &self.inner.edge_count())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Version stamp, unique per built graph. Derived indices are keyed on it.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Add a node. Returns `false` (and keeps the existing node) on duplicate id.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        let id = node.id.clone();
        let idx = self.inner.add_node(node);
        self.index.insert(id, idx);
        true
    }

    /// Add a link between two existing nodes and bump `connections` on both
    /// endpoints. Links with a missing endpoint are dropped and `false` returned.
    pub fn add_link(&mut self, link: GraphLink) -> bool {
        let (Some(&source), Some(&target)) = (self.index.get(&link.source), self.index.get(&link.target))
        else {
            return false;
        };
        self.inner.add_edge(source, target, link);
        for idx in [source, target] {
            if let Some(node) = self.inner.node_weight_mut(idx) {
                node.connections += 1;
            }
        }
        true
    }

    /// Get a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index.get(id).and_then(|&idx| self.inner.node_weight(idx))
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut GraphNode> {
        let idx = *self.index.get(id)?;
        self.inner.node_weight_mut(idx)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of links.
    pub fn link_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Mutable access to every node, used by analytics annotation passes.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.inner.node_weights_mut()
    }

    /// Iterate over all links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &GraphLink> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    /// All links touching a node, regardless of direction.
    pub fn links_of(&self, id: &NodeId) -> impl Iterator<Item = &GraphLink> {
        let idx = self.index.get(id).copied();
        idx.into_iter().flat_map(move |idx| {
            let outgoing = self.inner.edges_directed(idx, petgraph::Direction::Outgoing);
            let incoming = self
                .inner
                .edges_directed(idx, petgraph::Direction::Incoming)
                // self loops are already reported by the outgoing side
                .filter(|e| e.source() != e.target());
            outgoing
                .chain(incoming)
                .filter_map(move |e| self.inner.edge_weight(e.id()))
        })
    }

    /// Ids of nodes sharing a link with `id`, either direction.
    pub fn neighbors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        let idx = self.index.get(id).copied();
        idx.into_iter().flat_map(move |idx| {
            self.inner
                .neighbors_undirected(idx)
                .filter_map(move |n| self.inner.node_weight(n))
                .map(|n| &n.id)
        })
    }

    /// Dense position of a node within the arena, in `[0, node_count)`.
    pub(crate) fn dense_index(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).map(|idx| idx.index())
    }

    pub(crate) fn link_endpoints(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.inner
            .edge_indices()
            .filter_map(move |e: EdgeIndex| self.inner.edge_endpoints(e))
            .map(|(s, t)| (s.index(), t.index()))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
