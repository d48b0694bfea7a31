//! Integration tests for notegraph
//!
//! These tests drive the whole pipeline: notes on disk, item loading, graph
//! construction, analytics, layout and the interaction controller.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use notegraph_core::{GraphConfig, LinkKind, NodeId, build_annotated};
use notegraph_layout::FRAME_SECONDS;
use notegraph_view::{EngineConfig, InteractionController, RenderFrame};
use notegraph_watcher::{NotesWatcher, WatcherConfig, load_items};
use tempfile::TempDir;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

/// A small vault: two linked project notes, a journal entry and an
/// untouched inbox note.
fn write_vault(root: &Path) {
    fs::create_dir_all(root.join("projects")).unwrap();
    fs::create_dir_all(root.join("journal")).unwrap();
    fs::write(
        root.join("projects/engine.md"),
        "---\ntags: [rust, graph]\n---\nThe layout lives in [[physics]].\n",
    )
    .unwrap();
    fs::write(
        root.join("projects/physics.md"),
        "Forces for the #rust #graph engine, with #math. See [[engine|the engine]].\n",
    )
    .unwrap();
    fs::write(root.join("projects/renderer.md"), "#rust #graph drawing code\n").unwrap();
    fs::write(root.join("journal/monday.md"), "#daily worked on [[engine#layout]]\n").unwrap();
    fs::write(root.join("inbox.txt"), "nothing linked here").unwrap();
}

fn run_frames(ctrl: &mut InteractionController, frames: usize) {
    let mut now = Instant::now();
    for _ in 0..frames {
        now += Duration::from_millis(16);
        ctrl.on_frame(now, FRAME_SECONDS);
    }
}

#[test]
fn test_vault_to_graph() {
    let dir = TempDir::new().unwrap();
    write_vault(dir.path());

    let items = load_items(dir.path()).unwrap();
    let (graph, metrics) = build_annotated(&items, &GraphConfig::default());

    // 2 folders + 5 notes
    assert_eq!(graph.node_count(), 7);

    let engine = id("projects/engine.md");
    let physics = id("projects/physics.md");
    let link = graph
        .links_of(&engine)
        .find(|l| l.touches(&physics))
        .expect("engine and physics are linked");
    // references both ways outweigh the 2/3 tag overlap
    assert!(link.bidirectional);
    assert_eq!(link.kind, LinkKind::Reference);
    assert_eq!(link.strength, 0.8);

    // the journal reference uses a heading suffix
    assert!(graph.neighbors(&id("journal/monday.md")).any(|n| n == &engine));

    // rust + graph notes form a cluster of three
    let cluster = metrics.clusters.iter().find(|c| c.members.len() == 3).unwrap();
    assert!(cluster.name == "graph" || cluster.name == "rust");
    assert!(cluster.members.contains(&id("projects/renderer.md")));

    let inbox = graph.node(&id("inbox.txt")).unwrap();
    assert!(inbox.is_orphan());
    assert_eq!(inbox.centrality, 0.0);
}

#[test]
fn test_controller_pipeline() {
    let dir = TempDir::new().unwrap();
    write_vault(dir.path());
    let items = load_items(dir.path()).unwrap();

    let mut ctrl = InteractionController::new(EngineConfig::default());
    ctrl.set_items(&items);
    run_frames(&mut ctrl, 600);
    assert!(ctrl.simulator().is_settled());

    let frame = ctrl.frame();
    assert_eq!(frame.nodes.len(), 7);
    assert!(frame.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));

    // linked notes end up closer together than the orphan is to anything linked
    let pos = |f: &RenderFrame, s: &str| {
        let n = f.node(&id(s)).unwrap();
        (n.x, n.y)
    };
    let dist = |a: (f64, f64), b: (f64, f64)| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
    let engine = pos(&frame, "projects/engine.md");
    let physics = pos(&frame, "projects/physics.md");
    let limit = ctrl.config().layout.link_distance * 3.0;
    assert!(dist(engine, physics) < limit);

    ctrl.set_show_orphans(false);
    assert!(!ctrl.visible().contains(&id("inbox.txt")));

    ctrl.focus(&id("journal/monday.md"), Some(1));
    let visible: Vec<&str> = ctrl.visible().nodes.iter().map(NodeId::as_str).collect();
    assert_eq!(visible, vec!["journal", "journal/monday.md", "projects/engine.md"]);
}

#[test]
fn test_rebuild_after_edit_preserves_layout() {
    let dir = TempDir::new().unwrap();
    write_vault(dir.path());

    let mut ctrl = InteractionController::default();
    ctrl.set_items(&load_items(dir.path()).unwrap());
    run_frames(&mut ctrl, 120);
    let before = ctrl.simulator().position(&id("projects/engine.md")).unwrap();

    fs::write(dir.path().join("projects/new.md"), "links to [[engine]]").unwrap();
    let diff = ctrl.set_items(&load_items(dir.path()).unwrap());

    assert_eq!(diff.added_nodes, vec![id("projects/new.md")]);
    assert!(diff.removed_nodes.is_empty());
    assert_eq!(ctrl.simulator().position(&id("projects/engine.md")), Some(before));
    assert!(ctrl.simulator().alpha() >= ctrl.config().layout.reheat_alpha);
}

#[test]
fn test_config_file_drives_engine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notegraph.toml");
    fs::write(
        &path,
        "[graph]\nlinkSharedTags = false\n\n[view]\nshowLabels = false\nfocusDepth = 1\n",
    )
    .unwrap();
    let config = EngineConfig::load(Some(&path), dir.path()).unwrap();

    let vault = dir.path().join("vault");
    write_vault(&vault);
    let mut ctrl = InteractionController::new(config);
    ctrl.set_items(&load_items(&vault).unwrap());

    // no shared-tag links: renderer has only its folder link
    assert_eq!(ctrl.graph().node(&id("projects/renderer.md")).unwrap().connections, 1);
    assert!(ctrl.frame().nodes.iter().all(|n| n.label.is_none()));
    assert!(ctrl.focus(&id("projects/renderer.md"), None));
    assert_eq!(ctrl.visible().len(), 2);
}

#[tokio::test]
async fn test_watcher_emits_snapshot_after_change() {
    let dir = TempDir::new().unwrap();
    write_vault(dir.path());
    let config = WatcherConfig {
        quiet_period: Duration::from_millis(100),
        ..WatcherConfig::default()
    };
    let mut watcher = NotesWatcher::new(dir.path(), config).unwrap();
    assert_eq!(watcher.snapshot().unwrap().items.len(), 7);

    fs::write(dir.path().join("later.md"), "[[engine]]").unwrap();

    let snapshot = tokio::time::timeout(Duration::from_secs(10), watcher.next_snapshot())
        .await
        .expect("watcher produced a snapshot")
        .expect("watcher still running")
        .unwrap();
    assert_eq!(snapshot.sequence, 1);
    assert!(snapshot.items.iter().any(|i| i.id == "later.md"));
}
