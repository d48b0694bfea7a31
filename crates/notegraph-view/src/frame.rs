//! Render snapshots handed to whatever draws the graph

use notegraph_core::{Graph, ItemKind, LinkKind, NodeId};
use notegraph_layout::{LayoutSimulator, PinState};
use serde::{Deserialize, Serialize};

use crate::config::ViewConfig;
use crate::filter::VisibleSet;
use crate::hover::HoverOverlay;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub kind: ItemKind,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
    pub opacity: f64,
    pub pinned: bool,
    pub selected: bool,
    /// Hops from the focus node, when focused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderLink {
    pub source: NodeId,
    pub target: NodeId,
    pub strength: f64,
    pub bidirectional: bool,
    pub kind: LinkKind,
    pub opacity: f64,
}

/// Everything visible in one frame, in graph insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub nodes: Vec<RenderNode>,
    pub links: Vec<RenderLink>,
    pub alpha: f64,
    pub settled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovered: Option<NodeId>,
}

impl RenderFrame {
    pub(crate) fn capture(
        graph: &Graph,
        visible: &VisibleSet,
        simulator: &LayoutSimulator,
        hover: Option<&HoverOverlay>,
        selected: Option<&NodeId>,
        view: &ViewConfig,
    ) -> Self {
        let dimmed = view.dimmed_opacity;
        let nodes = graph
            .nodes()
            .filter(|n| visible.contains(&n.id))
            .map(|n| {
                let body = simulator.body(&n.id);
                let position = body.map(|b| b.position).unwrap_or_default();
                RenderNode {
                    id: n.id.clone(),
                    label: view.show_labels.then(|| n.name.clone()),
                    kind: n.kind,
                    x: position.x,
                    y: position.y,
                    size: n.size,
                    color: n.color.clone(),
                    opacity: hover.map_or(1.0, |h| h.node_opacity(&n.id, dimmed)),
                    pinned: body.is_some_and(|b| !matches!(b.pin, PinState::Free)),
                    selected: selected == Some(&n.id),
                    hops: visible.focus_hops.get(&n.id).copied(),
                }
            })
            .collect();

        let links = visible
            .links
            .iter()
            .map(|l| RenderLink {
                source: l.source.clone(),
                target: l.target.clone(),
                strength: l.strength,
                bidirectional: l.bidirectional,
                kind: l.kind,
                opacity: hover.map_or(1.0, |h| h.link_opacity(l, dimmed)),
            })
            .collect();

        RenderFrame {
            nodes,
            links,
            alpha: simulator.alpha(),
            settled: simulator.is_settled(),
            hovered: hover.map(|h| h.node.clone()),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
