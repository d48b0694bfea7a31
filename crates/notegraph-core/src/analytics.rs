//! Graph analytics: degree centrality, adjacency index, components, clusters.
//!
//! All passes operate on a built [`Graph`] and are recomputed from scratch
//! whenever the graph is rebuilt. Nothing here is persisted across builds.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GraphConfig;
use crate::graph::Graph;
use crate::model::{GraphNode, NodeId};

/// Categorical palette, indexed by cluster rank.
pub const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
    "#bcbd22", "#393b79",
];

/// Color of nodes that belong to no cluster.
pub const UNCATEGORIZED_COLOR: &str = "#9e9e9e";

static NO_NEIGHBORS: BTreeSet<NodeId> = BTreeSet::new();

// ============================================================================
// Adjacency index
// ============================================================================

/// Undirected neighbor sets, built once per graph version.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex {
    version: u64,
    neighbors: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl AdjacencyIndex {
    pub fn build(graph: &Graph) -> Self {
        let mut neighbors: HashMap<NodeId, BTreeSet<NodeId>> = graph
            .nodes()
            .map(|n| (n.id.clone(), BTreeSet::new()))
            .collect();
        for link in graph.links() {
            if link.source == link.target {
                continue;
            }
            if let Some(set) = neighbors.get_mut(&link.source) {
                set.insert(link.target.clone());
            }
            if let Some(set) = neighbors.get_mut(&link.target) {
                set.insert(link.source.clone());
            }
        }
        Self {
            version: graph.version(),
            neighbors,
        }
    }

    /// Graph version this index was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_current(&self, graph: &Graph) -> bool {
        self.version == graph.version()
    }

    /// Ids with a direct link to or from `id`. Unknown ids have no neighbors.
    pub fn connected_nodes(&self, id: &NodeId) -> &BTreeSet<NodeId> {
        self.neighbors.get(id).unwrap_or(&NO_NEIGHBORS)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.neighbors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

// ============================================================================
// Result types
// ============================================================================

/// A group of nodes sharing a dominant tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// The dominant tag, used as the cluster label.
    pub name: String,
    pub members: Vec<NodeId>,
    /// `min(size / coherence_scale, 1)`.
    pub coherence: f64,
    pub color: String,
}

/// A weakly connected component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub index: usize,
    pub members: Vec<NodeId>,
}

/// Summary produced by an analytics pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetrics {
    pub node_count: usize,
    pub link_count: usize,
    pub orphan_count: usize,
    pub max_connections: usize,
    pub density: f64,
    pub clusters: Vec<Cluster>,
    pub components: Vec<Component>,
}

impl GraphMetrics {
    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.name == name)
    }
}

// ============================================================================
// Degree centrality
// ============================================================================

/// `connections / max(connections)`; all zeros for a single node or no links.
pub fn degree_centrality(graph: &Graph) -> HashMap<NodeId, f64> {
    let max = graph.nodes().map(|n| n.connections).max().unwrap_or(0);
    graph
        .nodes()
        .map(|n| {
            let score = if graph.node_count() < 2 || max == 0 {
                0.0
            } else {
                n.connections as f64 / max as f64
            };
            (n.id.clone(), score)
        })
        .collect()
}

// ============================================================================
// Connected components (union-find)
// ============================================================================

/// Components over the undirected view, largest first, ties broken by the
/// smallest member id. Members are sorted.
pub fn connected_components(graph: &Graph) -> Vec<Component> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut sets = UnionFind::<usize>::new(n);
    for (s, t) in graph.link_endpoints() {
        sets.union(s, t);
    }

    let mut groups: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for node in graph.nodes() {
        if let Some(i) = graph.dense_index(&node.id) {
            groups.entry(sets.find(i)).or_default().push(node.id.clone());
        }
    }

    let mut members: Vec<Vec<NodeId>> = groups
        .into_values()
        .map(|mut m| {
            m.sort();
            m
        })
        .collect();
    members.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

    members
        .into_iter()
        .enumerate()
        .map(|(index, members)| Component { index, members })
        .collect()
}

// ============================================================================
// Dominant-tag clustering
// ============================================================================

/// Group nodes by their most frequent shared tag.
///
/// Returns the per-node label map and the accepted clusters, largest first.
/// Ties between tags of equal frequency go to the lexically smallest tag.
pub fn detect_clusters(graph: &Graph, config: &GraphConfig) -> (HashMap<NodeId, String>, Vec<Cluster>) {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for node in graph.nodes() {
        for tag in &node.tags {
            *frequency.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut groups: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for node in graph.nodes() {
        let mut best: Option<(&str, usize)> = None;
        // BTreeSet iterates in lexical order, so strict `>` keeps the smallest tag on ties
        for tag in &node.tags {
            let count = frequency.get(tag.as_str()).copied().unwrap_or(0);
            if count < 2 {
                continue;
            }
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((tag.as_str(), count));
            }
        }
        if let Some((tag, _)) = best {
            groups.entry(tag).or_default().push(node.id.clone());
        }
    }

    let mut accepted: Vec<(String, Vec<NodeId>)> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= config.min_cluster_size)
        .map(|(tag, mut members)| {
            members.sort();
            (tag.to_string(), members)
        })
        .collect();
    accepted.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));

    let mut labels = HashMap::new();
    let clusters = accepted
        .into_iter()
        .enumerate()
        .map(|(rank, (name, members))| {
            for id in &members {
                labels.insert(id.clone(), name.clone());
            }
            Cluster {
                coherence: (members.len() as f64 / config.coherence_scale).min(1.0),
                color: PALETTE[rank % PALETTE.len()].to_string(),
                name,
                members,
            }
        })
        .collect();

    (labels, clusters)
}

// ============================================================================
// Top-K queries
// ============================================================================

/// The `k` nodes with the most connections, ties by id.
pub fn most_connected(graph: &Graph, k: usize) -> Vec<&GraphNode> {
    let mut nodes: Vec<&GraphNode> = graph.nodes().collect();
    nodes.sort_by(|a, b| b.connections.cmp(&a.connections).then_with(|| a.id.cmp(&b.id)));
    nodes.truncate(k);
    nodes
}

/// The `k` nodes with the highest centrality, ties by id.
pub fn most_central(graph: &Graph, k: usize) -> Vec<&GraphNode> {
    let mut nodes: Vec<&GraphNode> = graph.nodes().collect();
    nodes.sort_by(|a, b| b.centrality.total_cmp(&a.centrality).then_with(|| a.id.cmp(&b.id)));
    nodes.truncate(k);
    nodes
}

// ============================================================================
// Annotation pass
// ============================================================================

/// Runs every analytics pass and writes the results onto the graph's nodes.
#[derive(Debug, Clone, Default)]
pub struct GraphAnalytics {
    config: GraphConfig,
}

impl GraphAnalytics {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Annotate centrality, cluster, component, size and color in place.
    pub fn annotate(&self, graph: &mut Graph) -> GraphMetrics {
        let centrality = degree_centrality(graph);
        let components = connected_components(graph);
        let (labels, clusters) = detect_clusters(graph, &self.config);

        let component_of: HashMap<&NodeId, usize> = components
            .iter()
            .flat_map(|c| c.members.iter().map(move |id| (id, c.index)))
            .collect();
        let color_of: HashMap<&str, &str> = clusters
            .iter()
            .map(|c| (c.name.as_str(), c.color.as_str()))
            .collect();

        let mut updates = Vec::with_capacity(graph.node_count());
        for node in graph.nodes() {
            let cluster = labels.get(&node.id).cloned();
            let color = cluster
                .as_deref()
                .and_then(|c| color_of.get(c).copied())
                .unwrap_or(UNCATEGORIZED_COLOR)
                .to_string();
            updates.push((
                node.id.clone(),
                centrality.get(&node.id).copied().unwrap_or(0.0),
                cluster,
                color,
                component_of.get(&node.id).copied().unwrap_or(0),
                self.node_size(node.connections),
            ));
        }
        for (id, score, cluster, color, component, size) in updates {
            if let Some(node) = graph.node_mut(&id) {
                node.centrality = score;
                node.cluster = cluster;
                node.color = color;
                node.component = component;
                node.size = size;
            }
        }

        let n = graph.node_count();
        let links = graph.link_count();
        let metrics = GraphMetrics {
            node_count: n,
            link_count: links,
            orphan_count: graph.nodes().filter(|node| node.is_orphan()).count(),
            max_connections: graph.nodes().map(|node| node.connections).max().unwrap_or(0),
            density: if n < 2 {
                0.0
            } else {
                (2 * links) as f64 / (n * (n - 1)) as f64
            },
            clusters,
            components,
        };

        debug!(
            nodes = metrics.node_count,
            links = metrics.link_count,
            clusters = metrics.clusters.len(),
            components = metrics.components.len(),
            "Annotated graph"
        );
        metrics
    }

    fn node_size(&self, connections: usize) -> f64 {
        let size = self.config.base_node_size + (connections as f64).sqrt() * self.config.node_size_scale;
        size.min(self.config.max_node_size)
    }
}
