//! Neighborhood focus: undirected breadth-first search bounded by hop count

use std::collections::{BTreeMap, VecDeque};

use notegraph_core::{AdjacencyIndex, NodeId};

/// A focus request: keep nodes within `depth` hops of `node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focus {
    pub node: NodeId,
    pub depth: usize,
}

/// Hop distance from `start` to every node reachable in at most `depth` hops.
///
/// Depth 0 yields only the start node. An id missing from the index yields
/// an empty map.
pub fn neighborhood(index: &AdjacencyIndex, start: &NodeId, depth: usize) -> BTreeMap<NodeId, usize> {
    let mut hops = BTreeMap::new();
    if !index.contains(start) {
        return hops;
    }

    hops.insert(start.clone(), 0);
    let mut queue = VecDeque::from([(start.clone(), 0usize)]);
    while let Some((id, dist)) = queue.pop_front() {
        if dist == depth {
            continue;
        }
        for next in index.connected_nodes(&id) {
            if !hops.contains_key(next) {
                hops.insert(next.clone(), dist + 1);
                queue.push_back((next.clone(), dist + 1));
            }
        }
    }
    hops
}
