//! Test fixtures for graph construction

use crate::model::ContentItem;

/// A tagged note with no body.
pub fn tagged(id: &str, tags: &[&str]) -> ContentItem {
    ContentItem::note(id, id).with_tags(tags.iter().copied())
}

/// A note whose body references each of `targets` as `[[target]]`.
pub fn referencing(id: &str, targets: &[&str]) -> ContentItem {
    let body = targets
        .iter()
        .map(|t| format!("see [[{t}]]"))
        .collect::<Vec<_>>()
        .join("\n");
    ContentItem::note(id, id).with_content(body)
}

/// The four-item example: A, B, C tagged `proj`, D tagged `other`.
pub fn project_items() -> Vec<ContentItem> {
    vec![
        tagged("A", &["proj"]),
        tagged("B", &["proj"]),
        tagged("C", &["proj"]),
        tagged("D", &["other"]),
    ]
}

/// X → Y → Z linked by references.
pub fn chain_items() -> Vec<ContentItem> {
    vec![
        referencing("X", &["Y"]),
        referencing("Y", &["Z"]),
        ContentItem::note("Z", "Z"),
    ]
}

/// A small vault mixing folders, references and tags.
pub fn vault_items() -> Vec<ContentItem> {
    vec![
        ContentItem::folder("projects", "Projects"),
        ContentItem::folder("journal", "Journal"),
        ContentItem::note("projects/engine", "Engine")
            .with_parent("projects")
            .with_tags(["rust", "graph"])
            .with_content("Layout lives in [[Physics]]. Also [[Missing Note]]."),
        ContentItem::note("projects/physics", "Physics")
            .with_parent("projects")
            .with_tags(["rust", "graph", "math"])
            .with_content("Back to [[Engine]]."),
        ContentItem::note("journal/monday", "Monday")
            .with_parent("journal")
            .with_tags(["daily"]),
        ContentItem::note("inbox", "Inbox").with_parent("archive"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referencing_writes_one_link_per_target() {
        let item = referencing("a", &["b", "c"]);
        let body = item.content.unwrap_or_default();
        assert!(body.contains("[[b]]"));
        assert!(body.contains("[[c]]"));
    }
}
