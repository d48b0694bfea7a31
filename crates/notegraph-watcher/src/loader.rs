//! Content item loading from JSON snapshots and notes directories

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use notegraph_core::{ContentItem, ItemKind};
use regex::Regex;
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

/// File patterns treated as notes when none are configured.
pub const DEFAULT_NOTE_PATTERNS: &[&str] = &["*.md", "*.markdown", "*.txt"];

/// `#tag` preceded by start of line or whitespace; `# Heading` does not match.
static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}_][\p{L}\p{N}_/-]*)").expect("inline tag pattern is valid")
});

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Source not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid item snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid note pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Load items from `source`: a directory of notes or a JSON array of items.
pub fn load_items(source: &Path) -> Result<Vec<ContentItem>, LoadError> {
    if source.is_dir() {
        NoteLoader::with_defaults(source)?.load()
    } else if source.is_file() {
        load_snapshot(source)
    } else {
        Err(LoadError::NotFound(source.to_path_buf()))
    }
}

/// Read a JSON array of items.
pub fn load_snapshot(path: &Path) -> Result<Vec<ContentItem>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let items: Vec<ContentItem> = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

// ============================================================================
// Notes directory
// ============================================================================

/// Walks a notes directory and turns folders and note files into items.
///
/// `.gitignore` and `.ignore` files are honored, hidden entries are skipped.
#[derive(Debug, Clone)]
pub struct NoteLoader {
    root: PathBuf,
    matcher: GlobSet,
}

impl NoteLoader {
    pub fn new<S: AsRef<str>>(root: impl Into<PathBuf>, patterns: &[S]) -> Result<Self, LoadError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            root: root.into(),
            matcher: builder.build()?,
        })
    }

    pub fn with_defaults(root: impl Into<PathBuf>) -> Result<Self, LoadError> {
        Self::new(root, DEFAULT_NOTE_PATTERNS)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when the file name matches one of the note patterns.
    pub fn is_note(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.matcher.is_match(name))
    }

    /// Item id for a path under the root: the relative path with `/`
    /// separators.
    pub fn item_id(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    fn parent_id(&self, path: &Path) -> Option<String> {
        path.parent().and_then(|p| self.item_id(p))
    }

    pub fn load(&self) -> Result<Vec<ContentItem>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::NotFound(self.root.clone()));
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .ignore(true)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut items = Vec::new();
        let mut skipped = 0usize;
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Walker error: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            let path = entry.path();
            let Some(id) = self.item_id(path) else {
                continue;
            };
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());

            if is_dir {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| id.clone());
                let mut folder = ContentItem::folder(id, name);
                folder.parent_id = self.parent_id(path);
                folder.updated_at = modified_at(path);
                items.push(folder);
            } else if self.is_note(path) {
                match self.load_note(path, id) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        warn!("Skipping unreadable note: {}", e);
                        skipped += 1;
                    }
                }
            }
        }

        info!(
            items = items.len(),
            skipped,
            "Loaded notes from {}",
            self.root.display()
        );
        Ok(items)
    }

    /// Read a single note file into an item with the given id.
    pub fn load_note(&self, path: &Path, id: String) -> Result<ContentItem, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = parse_note(&text);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.clone());

        debug!("Loaded note {} with {} tags", id, parsed.tags.len());
        Ok(ContentItem {
            name: parsed.title.unwrap_or(stem),
            parent_id: self.parent_id(path),
            tags: parsed.tags.into_iter().collect(),
            content: Some(parsed.body),
            kind: ItemKind::Note,
            updated_at: modified_at(path),
            id,
        })
    }
}

fn modified_at(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_default()
}

// ============================================================================
// Note parsing
// ============================================================================

/// A note split into front matter fields and body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedNote {
    /// `title` from front matter, if any.
    pub title: Option<String>,
    /// Front matter tags and inline `#tags`, without the leading `#`.
    pub tags: BTreeSet<String>,
    /// Text after the front matter block.
    pub body: String,
}

/// Split optional YAML front matter from the body and collect tags.
///
/// Front matter is a leading block delimited by `---` lines. A block that
/// fails to parse is kept as body text.
pub fn parse_note(text: &str) -> ParsedNote {
    let mut note = ParsedNote::default();

    let (front, body) = split_front_matter(text);
    note.body = body.to_string();

    if let Some(front) = front {
        match serde_yaml::from_str::<Value>(front) {
            Ok(value) => {
                note.title = value.get("title").and_then(Value::as_str).map(str::to_string);
                for key in ["tags", "tag"] {
                    if let Some(tags) = value.get(key) {
                        collect_yaml_tags(tags, &mut note.tags);
                    }
                }
            }
            Err(e) => {
                debug!("Ignoring malformed front matter: {}", e);
                note.body = text.to_string();
            }
        }
    }

    collect_inline_tags(&note.body, &mut note.tags);
    note
}

fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("---\n").or_else(|| text.strip_prefix("---\r\n")) else {
        return (None, text);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

fn collect_yaml_tags(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for tag in s.split([',', ' ']) {
                push_tag(tag, out);
            }
        }
        Value::Sequence(seq) => {
            for v in seq {
                match v {
                    Value::String(s) => push_tag(s, out),
                    Value::Number(n) => push_tag(&n.to_string(), out),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn collect_inline_tags(body: &str, out: &mut BTreeSet<String>) {
    let mut in_fence = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for cap in INLINE_TAG.captures_iter(line) {
            let tag = &cap[1];
            // #123 is an issue reference, not a tag
            if tag.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            push_tag(tag, out);
        }
    }
}

fn push_tag(raw: &str, out: &mut BTreeSet<String>) {
    let tag = raw.trim().trim_start_matches('#');
    if !tag.is_empty() {
        out.insert(tag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_front_matter_and_inline_tags() {
        let note = parse_note("---\ntitle: Engine Notes\ntags: [rust, graph]\n---\nSee #physics and [[Physics]].\n");
        assert_eq!(note.title.as_deref(), Some("Engine Notes"));
        assert_eq!(
            note.tags,
            ["graph", "physics", "rust"].into_iter().map(String::from).collect()
        );
        assert_eq!(note.body, "See #physics and [[Physics]].\n");
    }

    #[test]
    fn test_tags_as_string() {
        let note = parse_note("---\ntags: \"daily, journal\"\n---\nbody");
        assert!(note.tags.contains("daily"));
        assert!(note.tags.contains("journal"));
        assert_eq!(note.tags.len(), 2);
    }

    #[test]
    fn test_headings_code_and_numbers_are_not_tags() {
        let note = parse_note("# Heading\nfix #42 later\n```\n#not-a-tag\n```\nreal #tag-one\nmid#word\n");
        assert_eq!(note.tags, ["tag-one"].into_iter().map(String::from).collect());
    }

    #[test]
    fn test_no_front_matter() {
        let note = parse_note("plain text");
        assert_eq!(note.body, "plain text");
        assert!(note.title.is_none());
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let text = "---\ntags: [a]\nno closing line";
        let note = parse_note(text);
        assert_eq!(note.body, text);
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("projects")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("projects/engine.md"), "---\ntags: [rust]\n---\nUses [[physics]]").unwrap();
        fs::write(root.join("projects/physics.md"), "#rust #math").unwrap();
        fs::write(root.join("inbox.txt"), "loose").unwrap();
        fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join(".obsidian/config.md"), "hidden").unwrap();
        fs::write(root.join("draft.md"), "ignored").unwrap();
        fs::write(root.join(".gitignore"), "draft.md\n").unwrap();

        let items = load_items(root).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["inbox.txt", "projects", "projects/engine.md", "projects/physics.md"]);

        let folder = &items[1];
        assert_eq!(folder.kind, ItemKind::Folder);
        assert_eq!(folder.name, "projects");
        assert!(folder.parent_id.is_none());

        let engine = &items[2];
        assert_eq!(engine.name, "engine");
        assert_eq!(engine.parent_id.as_deref(), Some("projects"));
        assert_eq!(engine.tags, vec!["rust".to_string()]);
        assert_eq!(engine.content.as_deref(), Some("Uses [[physics]]"));

        assert_eq!(items[3].tags, vec!["math".to_string(), "rust".to_string()]);
    }

    #[test]
    fn test_load_json_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        fs::write(
            &path,
            r#"[{"id": "a", "name": "A", "tags": ["x"], "updatedAt": "2024-01-01T00:00:00Z"},
                {"id": "b", "name": "B", "rawBody": "[[A]]", "updatedAt": "2024-01-02T00:00:00Z"}]"#,
        )
        .unwrap();
        let items = load_items(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].content.as_deref(), Some("[[A]]"));
    }

    #[test]
    fn test_missing_and_malformed_sources() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_items(&dir.path().join("missing")),
            Err(LoadError::NotFound(_))
        ));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{not json").unwrap();
        assert!(matches!(load_items(&bad), Err(LoadError::Json { .. })));
    }

    #[test]
    fn test_custom_patterns() {
        let loader = NoteLoader::new("/notes", &["*.org"]).unwrap();
        assert!(loader.is_note(Path::new("/notes/a.org")));
        assert!(!loader.is_note(Path::new("/notes/a.md")));
        assert_eq!(loader.item_id(Path::new("/notes/x/a.org")).as_deref(), Some("x/a.org"));
        assert!(NoteLoader::new("/notes", &["[oops"]).is_err());
    }
}
