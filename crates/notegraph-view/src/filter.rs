//! Filter state and the visible subgraph it selects

use std::collections::{BTreeMap, BTreeSet};

use notegraph_core::{AdjacencyIndex, Graph, GraphLink, GraphNode, NodeId};
use tracing::{debug, warn};

use crate::focus::{Focus, neighborhood};

/// Every active filter. A node is visible only when it passes all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Case-insensitive substring of the node name. Blank matches everything.
    pub search: String,
    /// Keep nodes carrying any of these tags. Empty disables the filter.
    pub tags: BTreeSet<String>,
    /// Keep nodes in any of these clusters. Empty disables the filter.
    pub clusters: BTreeSet<String>,
    pub show_orphans: bool,
    pub focus: Option<Focus>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            tags: BTreeSet::new(),
            clusters: BTreeSet::new(),
            show_orphans: true,
            focus: None,
        }
    }
}

impl FilterState {
    /// True when at least one filter narrows the graph.
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty()
            || !self.tags.is_empty()
            || !self.clusters.is_empty()
            || !self.show_orphans
            || self.focus.is_some()
    }

    /// Evaluate every filter except focus against a single node.
    pub fn matches(&self, node: &GraphNode) -> bool {
        let query = self.search.trim().to_lowercase();
        if !query.is_empty() && !node.name.to_lowercase().contains(&query) {
            return false;
        }
        if !self.tags.is_empty() && node.tags.is_disjoint(&self.tags) {
            return false;
        }
        if !self.clusters.is_empty() && !node.cluster.as_ref().is_some_and(|c| self.clusters.contains(c)) {
            return false;
        }
        self.show_orphans || !node.is_orphan()
    }
}

/// Result of applying a [`FilterState`] to a graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    pub nodes: BTreeSet<NodeId>,
    /// Links with both endpoints visible.
    pub links: Vec<GraphLink>,
    /// Hop counts from the focus node, when a focus is in effect.
    pub focus_hops: BTreeMap<NodeId, usize>,
    /// The focus actually applied; `None` if the requested node is gone.
    pub focus: Option<Focus>,
}

impl VisibleSet {
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Select the visible nodes and links.
///
/// The focus neighborhood is searched over the full graph and then
/// intersected with the other filters, so hidden nodes still carry the
/// search outward.
pub fn visible_subgraph(graph: &Graph, index: &AdjacencyIndex, filters: &FilterState) -> VisibleSet {
    let focus = match &filters.focus {
        Some(f) if graph.contains(&f.node) => Some(f.clone()),
        Some(f) => {
            warn!("Focus node {} not in graph, ignoring focus", f.node);
            None
        }
        None => None,
    };
    let focus_hops = focus
        .as_ref()
        .map(|f| neighborhood(index, &f.node, f.depth))
        .unwrap_or_default();

    let nodes: BTreeSet<NodeId> = graph
        .nodes()
        .filter(|n| filters.matches(n))
        .filter(|n| focus.is_none() || focus_hops.contains_key(&n.id))
        .map(|n| n.id.clone())
        .collect();

    let links: Vec<GraphLink> = graph
        .links()
        .filter(|l| nodes.contains(&l.source) && nodes.contains(&l.target))
        .cloned()
        .collect();

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        total = graph.node_count(),
        "Computed visible subgraph"
    );

    VisibleSet {
        nodes,
        links,
        focus_hops,
        focus,
    }
}
