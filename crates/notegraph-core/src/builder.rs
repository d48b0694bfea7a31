//! Derives nodes and deduplicated links from raw content items

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::config::GraphConfig;
use crate::graph::Graph;
use crate::model::{ContentItem, GraphLink, GraphNode, LinkKind, NodeId};

/// `[[Target]]`, `[[Target|alias]]` and `[[Target#heading]]`.
static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|#]+)(?:[|#][^\[\]]*)?\]\]").expect("wiki link pattern is valid")
});

/// Every relationship signal seen for one unordered pair of nodes.
#[derive(Debug)]
struct PairSignals {
    /// Signal from the smaller id towards the larger one.
    forward: bool,
    backward: bool,
    /// Signal that has no direction (shared tags).
    symmetric: bool,
    strength: f64,
    kind: LinkKind,
}

impl PairSignals {
    fn into_link(self, low: NodeId, high: NodeId) -> GraphLink {
        let bidirectional = self.symmetric || (self.forward && self.backward);
        let (source, target) = if bidirectional || self.forward {
            (low, high)
        } else {
            (high, low)
        };
        GraphLink {
            source,
            target,
            strength: self.strength,
            bidirectional,
            kind: self.kind,
        }
    }
}

/// Resolves `[[...]]` targets to item ids: exact id, exact name, then
/// case-insensitive name. First item wins on name collisions.
struct TargetResolver<'a> {
    ids: HashMap<&'a str, &'a str>,
    names: HashMap<&'a str, &'a str>,
    folded_names: HashMap<String, &'a str>,
}

impl<'a> TargetResolver<'a> {
    fn new(items: &'a [ContentItem]) -> Self {
        let mut ids = HashMap::new();
        let mut names = HashMap::new();
        let mut folded_names = HashMap::new();
        for item in items {
            ids.entry(item.id.as_str()).or_insert(item.id.as_str());
            names.entry(item.name.as_str()).or_insert(item.id.as_str());
            folded_names
                .entry(item.name.to_lowercase())
                .or_insert(item.id.as_str());
        }
        Self {
            ids,
            names,
            folded_names,
        }
    }

    fn resolve(&self, target: &str) -> Option<&'a str> {
        let target = target.trim();
        self.ids
            .get(target)
            .or_else(|| self.names.get(target))
            .or_else(|| self.folded_names.get(&target.to_lowercase()))
            .copied()
    }
}

/// Turns a flat item collection into a [`Graph`].
#[derive(Debug, Clone, Default)]
pub struct GraphModelBuilder {
    config: GraphConfig,
}

impl GraphModelBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Build a fresh graph. Dangling references and unknown parents are
    /// dropped; this never fails.
    pub fn build(&self, items: &[ContentItem]) -> Graph {
        let mut graph = Graph::new();
        let mut kept: Vec<&ContentItem> = Vec::with_capacity(items.len());

        for item in items {
            if graph.add_node(GraphNode::from_item(item)) {
                kept.push(item);
            } else {
                debug!("Duplicate item id {:?}, keeping the first occurrence", item.id);
            }
        }

        let mut pairs: BTreeMap<(NodeId, NodeId), PairSignals> = BTreeMap::new();
        self.collect_references(items, &kept, &mut pairs);
        self.collect_hierarchy(&graph, &kept, &mut pairs);
        if self.config.link_shared_tags {
            self.collect_shared_tags(&graph, &mut pairs);
        }

        let mut dropped = 0usize;
        for ((low, high), signals) in pairs {
            if !graph.add_link(signals.into_link(low, high)) {
                dropped += 1;
            }
        }

        debug!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            dropped,
            "Built relationship graph"
        );
        graph
    }

    fn collect_references(
        &self,
        items: &[ContentItem],
        kept: &[&ContentItem],
        pairs: &mut BTreeMap<(NodeId, NodeId), PairSignals>,
    ) {
        let resolver = TargetResolver::new(items);
        for item in kept {
            let Some(body) = item.content.as_deref() else {
                continue;
            };
            for capture in WIKI_LINK.captures_iter(body) {
                let raw = &capture[1];
                match resolver.resolve(raw) {
                    Some(target) if target != item.id => record(
                        pairs,
                        &item.id,
                        target,
                        false,
                        self.config.reference_strength,
                        LinkKind::Reference,
                    ),
                    Some(_) => trace!("Ignoring self reference in {:?}", item.id),
                    None => trace!("Unresolved reference [[{}]] in {:?}", raw, item.id),
                }
            }
        }
    }

    fn collect_hierarchy(
        &self,
        graph: &Graph,
        kept: &[&ContentItem],
        pairs: &mut BTreeMap<(NodeId, NodeId), PairSignals>,
    ) {
        for item in kept {
            let Some(parent) = item.parent_id.as_deref() else {
                continue;
            };
            if parent == item.id || !graph.contains(&NodeId::from(parent)) {
                trace!("Parent {:?} of {:?} not found, treating as root", parent, item.id);
                continue;
            }
            record(
                pairs,
                &item.id,
                parent,
                false,
                self.config.hierarchy_strength,
                LinkKind::Hierarchy,
            );
        }
    }

    fn collect_shared_tags(&self, graph: &Graph, pairs: &mut BTreeMap<(NodeId, NodeId), PairSignals>) {
        let nodes: Vec<&GraphNode> = graph.nodes().collect();
        let mut postings: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            for tag in &node.tags {
                postings.entry(tag.as_str()).or_default().push(i);
            }
        }

        for (i, node) in nodes.iter().enumerate() {
            let candidates: BTreeSet<usize> = node
                .tags
                .iter()
                .filter_map(|t| postings.get(t.as_str()))
                .flatten()
                .copied()
                .filter(|&j| j > i)
                .collect();

            for j in candidates {
                let other = nodes[j];
                let similarity = jaccard(&node.tags, &other.tags);
                if similarity > self.config.tag_similarity_threshold {
                    record(
                        pairs,
                        node.id.as_str(),
                        other.id.as_str(),
                        true,
                        similarity,
                        LinkKind::SharedTags,
                    );
                }
            }
        }
    }
}

/// `|a ∩ b| / |a ∪ b|`, 0 when both are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

fn record(
    pairs: &mut BTreeMap<(NodeId, NodeId), PairSignals>,
    from: &str,
    to: &str,
    symmetric: bool,
    strength: f64,
    kind: LinkKind,
) {
    let forward = from < to;
    let key = if forward {
        (NodeId::from(from), NodeId::from(to))
    } else {
        (NodeId::from(to), NodeId::from(from))
    };

    let entry = pairs.entry(key).or_insert(PairSignals {
        forward: false,
        backward: false,
        symmetric: false,
        strength,
        kind,
    });
    if symmetric {
        entry.symmetric = true;
    } else if forward {
        entry.forward = true;
    } else {
        entry.backward = true;
    }
    if strength > entry.strength {
        entry.strength = strength;
        entry.kind = kind;
    }
}
