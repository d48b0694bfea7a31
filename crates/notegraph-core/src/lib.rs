//! Notegraph Core - item model, graph builder and graph analytics

pub mod analytics;
pub mod builder;
pub mod config;
pub mod diff;
pub mod graph;
pub mod model;


#[cfg(test)]
pub mod test_utils;

pub use analytics::{
    AdjacencyIndex, Cluster, Component, GraphAnalytics, GraphMetrics, connected_components, degree_centrality,
    detect_clusters, most_central, most_connected,
};
pub use builder::GraphModelBuilder;
pub use config::{ConfigError, GraphConfig};
pub use diff::{DiffEngine, GraphDiff};
pub use graph::Graph;
pub use model::{ContentItem, GraphLink, GraphNode, ItemKind, LinkKind, NodeId};

/// Build a graph from items and run every analytics pass over it.
pub fn build_annotated(items: &[ContentItem], config: &GraphConfig) -> (Graph, GraphMetrics) {
    let mut graph = GraphModelBuilder::new(config.clone()).build(items);
    let metrics = GraphAnalytics::new(config.clone()).annotate(&mut graph);
    (graph, metrics)
}
