//! CLI command implementations

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use notegraph_core::{GraphMetrics, NodeId, build_annotated, most_central, most_connected};
use notegraph_layout::FRAME_SECONDS;
use notegraph_view::{EngineConfig, InteractionController};
use notegraph_watcher::{NotesWatcher, WatcherConfig, load_items};
use serde::Serialize;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = EngineConfig::load(path, Path::new("."))?;
    tracing::debug!("Using config: {:?}", config);
    Ok(config)
}

fn load(source: &Path) -> anyhow::Result<Vec<notegraph_core::ContentItem>> {
    load_items(source).with_context(|| format!("Cannot load items from {}", source.display()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RankedNode {
    id: NodeId,
    name: String,
    connections: usize,
    centrality: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    metrics: GraphMetrics,
    most_connected: Vec<RankedNode>,
    most_central: Vec<RankedNode>,
}

pub fn stats(source: &Path, config: &EngineConfig, top: usize, json: bool) -> anyhow::Result<()> {
    let items = load(source)?;
    let (graph, metrics) = build_annotated(&items, &config.graph);

    let rank = |nodes: Vec<&notegraph_core::GraphNode>| -> Vec<RankedNode> {
        nodes
            .into_iter()
            .map(|n| RankedNode {
                id: n.id.clone(),
                name: n.name.clone(),
                connections: n.connections,
                centrality: n.centrality,
            })
            .collect()
    };
    let report = StatsReport {
        most_connected: rank(most_connected(&graph, top)),
        most_central: rank(most_central(&graph, top)),
        metrics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let m = &report.metrics;
    println!("Nodes:       {}", m.node_count);
    println!("Links:       {}", m.link_count);
    println!("Orphans:     {}", m.orphan_count);
    println!("Components:  {}", m.components.len());
    println!("Density:     {:.4}", m.density);
    println!();
    println!("Clusters:");
    if m.clusters.is_empty() {
        println!("  (none)");
    }
    for cluster in &m.clusters {
        println!(
            "  {:<20} {:>4} members  coherence {:.2}  {}",
            cluster.name,
            cluster.members.len(),
            cluster.coherence,
            cluster.color
        );
    }
    println!();
    println!("Most connected:");
    for n in &report.most_connected {
        println!("  {:>4}  {} ({})", n.connections, n.name, n.id);
    }
    Ok(())
}

pub struct LayoutOptions {
    pub ticks: usize,
    pub out: Option<PathBuf>,
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub clusters: Vec<String>,
    pub hide_orphans: bool,
    pub focus: Option<String>,
    pub depth: Option<usize>,
}

pub fn layout(source: &Path, config: &EngineConfig, opts: LayoutOptions) -> anyhow::Result<()> {
    let items = load(source)?;
    let mut ctrl = InteractionController::new(config.clone());
    ctrl.set_items(&items);

    if let Some(search) = &opts.search {
        ctrl.set_search(search);
    }
    if !opts.tags.is_empty() {
        ctrl.set_tags(opts.tags.iter().cloned());
    }
    if !opts.clusters.is_empty() {
        ctrl.set_clusters(opts.clusters.iter().cloned());
    }
    if opts.hide_orphans {
        ctrl.set_show_orphans(false);
    }
    if let Some(focus) = &opts.focus {
        if !ctrl.focus(&NodeId::new(focus.as_str()), opts.depth) {
            tracing::warn!("Focus node {} not found, showing the whole graph", focus);
        }
    }

    // start past the debounce deadline so deferred filter changes land first
    let mut now = Instant::now() + Duration::from_millis(ctrl.config().view.debounce_ms);
    let frame_time = Duration::from_secs_f64(FRAME_SECONDS);
    let mut ran = 0;
    while ran < opts.ticks {
        now += frame_time;
        if !ctrl.on_frame(now, FRAME_SECONDS) {
            break;
        }
        ran += 1;
    }
    tracing::info!(
        ticks = ran,
        visible = ctrl.visible().len(),
        settled = ctrl.simulator().is_settled(),
        "Layout finished"
    );

    let json = ctrl.frame().to_json()?;
    match &opts.out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Cannot write {}", path.display()))?;
            tracing::info!("Wrote frame to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn focus(source: &Path, config: &EngineConfig, id: &str, depth: Option<usize>) -> anyhow::Result<()> {
    let items = load(source)?;
    let mut ctrl = InteractionController::new(config.clone());
    ctrl.set_items(&items);

    let node = NodeId::new(id);
    if !ctrl.focus(&node, depth) {
        anyhow::bail!("No node with id {id}");
    }

    let mut hops: Vec<(&NodeId, usize)> = ctrl
        .visible()
        .focus_hops
        .iter()
        .filter(|(id, _)| ctrl.visible().contains(*id))
        .map(|(id, d)| (id, *d))
        .collect();
    hops.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    for (id, d) in hops {
        let name = ctrl.graph().node(id).map(|n| n.name.as_str()).unwrap_or_default();
        println!("{d}  {name} ({id})");
    }
    Ok(())
}

pub async fn watch(dir: &Path, config: EngineConfig) -> anyhow::Result<()> {
    let mut watcher = NotesWatcher::new(dir, WatcherConfig::default())?;
    let mut ctrl = InteractionController::new(config);

    let initial = watcher.snapshot()?;
    ctrl.set_items(&initial.items);
    tracing::info!(
        nodes = ctrl.graph().node_count(),
        links = ctrl.graph().link_count(),
        "Watching {}",
        watcher.root().display()
    );

    loop {
        tokio::select! {
            snapshot = watcher.next_snapshot() => {
                let Some(snapshot) = snapshot else {
                    break;
                };
                match snapshot {
                    Ok(snapshot) => {
                        let diff = ctrl.set_items(&snapshot.items);
                        println!(
                            "#{} +{} -{} ~{} nodes, +{} -{} links",
                            diff.sequence,
                            diff.added_nodes.len(),
                            diff.removed_nodes.len(),
                            diff.modified_nodes.len(),
                            diff.added_links.len(),
                            diff.removed_links.len()
                        );
                    }
                    Err(e) => tracing::error!("Reload failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watcher");
                break;
            }
        }
    }

    ctrl.destroy();
    Ok(())
}
