//! Core data structures for the relationship graph

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique, stable identifier for a node. Same value as the content item id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// Whether an item is a note or a folder grouping other items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    #[default]
    Note,
    Folder,
}

/// One raw content item as supplied by the host application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Raw note body; scanned for `[[Target]]` cross-references.
    #[serde(default, alias = "rawBody")]
    pub content: Option<String>,
    #[serde(default)]
    pub kind: ItemKind,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// A note with no parent, tags or body, stamped with the current time.
    pub fn note(id: impl Into<String>, name: impl Into<String>) -> Self {
        ContentItem {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            tags: Vec::new(),
            content: None,
            kind: ItemKind::Note,
            updated_at: Utc::now(),
        }
    }

    /// A folder item.
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        ContentItem {
            kind: ItemKind::Folder,
            ..ContentItem::note(id, name)
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// A graph vertex representing one content item.
///
/// Position, velocity and pin state are not stored here; the layout
/// simulator owns them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    pub name: String,
    pub kind: ItemKind,
    pub tags: BTreeSet<String>,
    /// Dominant-tag cluster label; `None` means uncategorized.
    pub cluster: Option<String>,
    /// Number of retained links incident to this node.
    pub connections: usize,
    /// Degree centrality normalized to `[0, 1]` over the current node set.
    pub centrality: f64,
    pub size: f64,
    pub color: String,
    /// Index of the connected component this node belongs to.
    pub component: usize,
    pub updated_at: DateTime<Utc>,
}

impl GraphNode {
    pub fn from_item(item: &ContentItem) -> Self {
        GraphNode {
            id: NodeId::new(item.id.clone()),
            name: item.name.clone(),
            kind: item.kind,
            tags: item
                .tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            cluster: None,
            connections: 0,
            centrality: 0.0,
            size: 0.0,
            color: String::new(),
            component: 0,
            updated_at: item.updated_at,
        }
    }

    /// True when no retained link touches this node.
    pub fn is_orphan(&self) -> bool {
        self.connections == 0
    }
}

/// Which relationship signal produced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkKind {
    /// `[[Target]]` cross-reference in a note body.
    Reference,
    /// Tag-set similarity above the Jaccard threshold.
    SharedTags,
    /// Folder containment, child → parent.
    Hierarchy,
}

/// A weighted, possibly bidirectional edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub source: NodeId,
    pub target: NodeId,
    /// In `(0, 1]`.
    pub strength: f64,
    pub bidirectional: bool,
    pub kind: LinkKind,
}

impl GraphLink {
    /// Unordered endpoint pair, smaller id first.
    pub fn key(&self) -> (NodeId, NodeId) {
        if self.source <= self.target {
            (self.source.clone(), self.target.clone())
        } else {
            (self.target.clone(), self.source.clone())
        }
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    pub fn other(&self, id: &NodeId) -> Option<&NodeId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}
