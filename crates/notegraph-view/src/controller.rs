//! Interaction controller: filters, focus, hover, selection and the frame loop
//!
//! The controller owns the built graph, its adjacency index and the layout
//! simulator. All handlers take `&mut self`; the host calls
//! [`on_frame`](InteractionController::on_frame) once per animation frame.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use notegraph_core::{
    AdjacencyIndex, ContentItem, DiffEngine, Graph, GraphAnalytics, GraphDiff, GraphMetrics, GraphModelBuilder,
    NodeId,
};
use notegraph_layout::{LayoutLink, LayoutNode, LayoutSimulator, Vec2};
use tracing::{debug, info, trace};

use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::filter::{FilterState, VisibleSet, visible_subgraph};
use crate::focus::Focus;
use crate::frame::RenderFrame;
use crate::hover::HoverOverlay;

/// Callback fired when a node is activated.
pub type SelectHandler = Box<dyn FnMut(&NodeId)>;

/// Pointer press in progress.
#[derive(Debug, Clone, PartialEq)]
struct Press {
    node: NodeId,
    origin: Vec2,
    dragging: bool,
}

/// Drives a graph view from content items to render frames.
pub struct InteractionController {
    config: EngineConfig,
    builder: GraphModelBuilder,
    analytics: GraphAnalytics,
    diffs: DiffEngine,

    graph: Graph,
    metrics: GraphMetrics,
    /// Released by `destroy`.
    index: Option<AdjacencyIndex>,

    /// Filters currently reflected in `visible`.
    filters: FilterState,
    /// Latest filters asked for; ahead of `filters` while debounced.
    requested: FilterState,
    pending: Debouncer<FilterState>,
    visible: VisibleSet,

    simulator: LayoutSimulator,
    hover: Option<HoverOverlay>,
    press: Option<Press>,
    selected: Option<NodeId>,
    on_select: Option<SelectHandler>,
    destroyed: bool,
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("nodes", &self.graph.node_count())
            .field("visible", &self.visible.len())
            .field("filters", &self.filters)
            .field("selected", &self.selected)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: EngineConfig) -> Self {
        let filters = FilterState {
            show_orphans: config.view.show_orphans,
            ..FilterState::default()
        };
        Self {
            builder: GraphModelBuilder::new(config.graph.clone()),
            analytics: GraphAnalytics::new(config.graph.clone()),
            diffs: DiffEngine::new(),
            graph: Graph::new(),
            metrics: GraphMetrics::default(),
            index: None,
            requested: filters.clone(),
            filters,
            pending: Debouncer::new(Duration::from_millis(config.view.debounce_ms)),
            visible: VisibleSet::default(),
            simulator: LayoutSimulator::new(config.layout.clone()),
            hover: None,
            press: None,
            selected: None,
            on_select: None,
            destroyed: false,
            config,
        }
    }

    /// Register the activation callback, replacing any previous one.
    pub fn on_select(&mut self, handler: impl FnMut(&NodeId) + 'static) {
        self.on_select = Some(Box::new(handler));
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn metrics(&self) -> &GraphMetrics {
        &self.metrics
    }

    pub fn index(&self) -> Option<&AdjacencyIndex> {
        self.index.as_ref()
    }

    /// Filters currently applied to the visible set.
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn simulator(&self) -> &LayoutSimulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut LayoutSimulator {
        &mut self.simulator
    }

    pub fn hover(&self) -> Option<&HoverOverlay> {
        self.hover.as_ref()
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// True while a filter change waits out its quiet period.
    pub fn has_pending_filters(&self) -> bool {
        self.pending.is_pending()
    }

    // =========================================================================
    // ITEMS
    // =========================================================================

    /// Rebuild the graph from a fresh item snapshot.
    ///
    /// Analytics are recomputed from scratch and the layout warm-starts from
    /// the previous positions of surviving nodes.
    pub fn set_items(&mut self, items: &[ContentItem]) -> GraphDiff {
        let mut graph = self.builder.build(items);
        self.metrics = self.analytics.annotate(&mut graph);
        let diff = self.diffs.compute_diff(&self.graph, &graph);
        self.graph = graph;
        self.index = Some(AdjacencyIndex::build(&self.graph));
        if self.destroyed {
            self.destroyed = false;
            self.simulator.play();
        }

        if self.hover.as_ref().is_some_and(|h| !self.graph.contains(&h.node)) {
            self.hover = None;
        }
        if self.selected.as_ref().is_some_and(|id| !self.graph.contains(id)) {
            self.selected = None;
        }

        info!(
            nodes = self.graph.node_count(),
            links = self.graph.link_count(),
            clusters = self.metrics.clusters.len(),
            added = diff.added_nodes.len(),
            removed = diff.removed_nodes.len(),
            "Rebuilt graph"
        );

        // a rebuild applies any filter change still waiting
        self.pending.cancel();
        self.apply_filters(self.requested.clone());
        diff
    }

    // =========================================================================
    // FILTERS
    // =========================================================================

    fn debounces(&self) -> bool {
        self.graph.node_count() >= self.config.view.debounce_threshold
    }

    /// Queue or apply the latest requested filters.
    fn request(&mut self, now: Instant) {
        if self.debounces() {
            trace!("Debouncing filter change");
            self.pending.schedule(self.requested.clone(), now);
        } else {
            self.apply_filters(self.requested.clone());
        }
    }

    pub fn set_search(&mut self, query: &str) {
        self.set_search_at(query, Instant::now());
    }

    pub fn set_search_at(&mut self, query: &str, now: Instant) {
        if self.requested.search == query {
            return;
        }
        self.requested.search = query.to_string();
        self.request(now);
    }

    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested.tags = tags.into_iter().map(Into::into).collect();
        self.request(Instant::now());
    }

    /// Add the tag to the tag filter, or remove it if present.
    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.requested.tags.remove(tag) {
            self.requested.tags.insert(tag.to_string());
        }
        self.request(Instant::now());
    }

    pub fn set_clusters<I, S>(&mut self, clusters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested.clusters = clusters.into_iter().map(Into::into).collect();
        self.request(Instant::now());
    }

    pub fn set_show_orphans(&mut self, show: bool) {
        if self.requested.show_orphans == show {
            return;
        }
        self.requested.show_orphans = show;
        self.request(Instant::now());
    }

    /// Reset every filter, including focus.
    pub fn clear_filters(&mut self) {
        self.requested = FilterState {
            show_orphans: self.config.view.show_orphans,
            ..FilterState::default()
        };
        self.pending.cancel();
        self.apply_filters(self.requested.clone());
    }

    /// Restrict the view to `depth` hops around `node` (configured depth when
    /// `None`). Returns `false` and leaves focus cleared if the node is
    /// unknown.
    pub fn focus(&mut self, node: &NodeId, depth: Option<usize>) -> bool {
        let depth = depth.unwrap_or(self.config.view.focus_depth);
        self.requested.focus = Some(Focus {
            node: node.clone(),
            depth,
        });
        self.pending.cancel();
        self.apply_filters(self.requested.clone());
        let applied = self.visible.focus.is_some();
        if !applied {
            self.requested.focus = None;
            self.filters.focus = None;
        }
        applied
    }

    pub fn clear_focus(&mut self) {
        if self.requested.focus.take().is_some() {
            self.pending.cancel();
            self.apply_filters(self.requested.clone());
        }
    }

    fn apply_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        let Some(index) = &self.index else {
            self.visible = VisibleSet::default();
            return;
        };
        self.visible = visible_subgraph(&self.graph, index, &self.filters);

        if self.hover.as_ref().is_some_and(|h| !self.visible.contains(&h.node)) {
            self.hover = None;
        }
        if self.press.as_ref().is_some_and(|p| !self.visible.contains(&p.node)) {
            debug!("Pressed node left the view, dropping press");
            self.press = None;
        }
        self.sync_layout();
    }

    /// Load the visible subgraph into the simulator, keeping positions.
    fn sync_layout(&mut self) {
        let nodes: Vec<LayoutNode> = self
            .graph
            .nodes()
            .filter(|n| self.visible.contains(&n.id))
            .map(|n| LayoutNode {
                id: n.id.clone(),
                radius: n.size,
            })
            .collect();
        let links: Vec<LayoutLink> = self
            .visible
            .links
            .iter()
            .map(|l| LayoutLink {
                source: l.source.clone(),
                target: l.target.clone(),
                strength: l.strength,
            })
            .collect();
        let warm = self.simulator.load(&nodes, &links);
        debug!(
            retained = warm.retained,
            seeded = warm.seeded,
            removed = warm.removed,
            "Synced layout with visible subgraph"
        );
    }

    // =========================================================================
    // FRAME LOOP
    // =========================================================================

    /// Apply any due filter change, then advance the layout by `dt` seconds.
    /// Returns whether the layout moved.
    pub fn on_frame(&mut self, now: Instant, dt: f64) -> bool {
        if self.destroyed {
            return false;
        }
        if let Some(filters) = self.pending.poll(now) {
            self.apply_filters(filters);
        }
        self.simulator.tick(dt)
    }

    /// Stop the frame loop and release the graph-derived state.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.pending.cancel();
        self.simulator.pause();
        self.simulator.clear();
        self.index = None;
        self.visible = VisibleSet::default();
        self.hover = None;
        self.press = None;
        self.on_select = None;
        self.destroyed = true;
        debug!("Controller destroyed");
    }

    // =========================================================================
    // HOVER / SELECTION
    // =========================================================================

    /// Highlight `id` and its direct neighbors. Ignored for hidden nodes.
    pub fn hover_enter(&mut self, id: &NodeId) -> bool {
        let Some(index) = &self.index else {
            return false;
        };
        if !self.visible.contains(id) {
            return false;
        }
        self.hover = Some(HoverOverlay::new(index, id));
        true
    }

    pub fn hover_leave(&mut self) {
        self.hover = None;
    }

    /// Activate a visible node and notify the select handler.
    pub fn click(&mut self, id: &NodeId) -> bool {
        if !self.visible.contains(id) {
            return false;
        }
        self.selected = Some(id.clone());
        debug!("Selected {}", id);
        if let Some(handler) = self.on_select.as_mut() {
            handler(id);
        }
        true
    }

    // =========================================================================
    // POINTER
    // =========================================================================

    /// Press at layout coordinates. Returns the node under the pointer.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<NodeId> {
        let node = self.simulator.node_at(x, y)?.clone();
        self.press = Some(Press {
            node: node.clone(),
            origin: Vec2::new(x, y),
            dragging: false,
        });
        Some(node)
    }

    /// Move the pointer: drags a pressed node once it travels past the drag
    /// threshold, otherwise updates hover.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some(press) = self.press.as_mut() {
            if press.dragging {
                self.simulator.drag_to(&press.node, x, y);
            } else if press.origin.distance(Vec2::new(x, y)) > self.config.view.drag_threshold {
                press.dragging = self.simulator.start_drag(&press.node, x, y);
            }
            return;
        }

        match self.simulator.node_at(x, y).cloned() {
            Some(id) => {
                if self.hover.as_ref().is_none_or(|h| h.node != id) {
                    self.hover_enter(&id);
                }
            }
            None => self.hover_leave(),
        }
    }

    /// Release the pointer. A press that never became a drag is a click.
    pub fn pointer_up(&mut self, _x: f64, _y: f64) {
        let Some(press) = self.press.take() else {
            return;
        };
        if press.dragging {
            self.simulator.end_drag(&press.node);
        } else {
            self.click(&press.node);
        }
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    /// Snapshot of everything a renderer needs for the current frame.
    pub fn frame(&self) -> RenderFrame {
        RenderFrame::capture(
            &self.graph,
            &self.visible,
            &self.simulator,
            self.hover.as_ref(),
            self.selected.as_ref(),
            &self.config.view,
        )
    }

    /// Tags present in the current graph, for building filter menus.
    pub fn all_tags(&self) -> BTreeSet<String> {
        self.graph.nodes().flat_map(|n| n.tags.iter().cloned()).collect()
    }
}
