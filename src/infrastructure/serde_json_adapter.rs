use crate::domain::model::{BookmarkEntry, FolderEntry, ParsedEntity};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Chromium-family `Bookmarks` file. Only `roots` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarksFileDto {
    #[serde(default)]
    pub roots: BTreeMap<String, BookmarkNodeDto>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BookmarkNodeDto {
    #[serde(rename = "type", default)]
    pub node_type: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub children: Vec<BookmarkNodeDto>,

    #[serde(default)]
    pub date_added: Option<String>,
}

impl BookmarkNodeDto {
    /// First ten characters of `date_added` (seconds precision), `"0"` when absent.
    pub fn add_date(&self) -> String {
        match self.date_added.as_deref() {
            Some(d) if !d.is_empty() => d.chars().take(10).collect(),
            _ => "0".to_string(),
        }
    }
}

// Trees can nest far deeper than the call stack allows, so children are
// unlinked onto a heap stack instead of dropped recursively.
impl Drop for BookmarkNodeDto {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Either a full file or a bare node; no `flatten`/`untagged` so nothing is buffered.
#[derive(Deserialize)]
struct TopLevelDto {
    #[serde(default)]
    roots: Option<BTreeMap<String, BookmarkNodeDto>>,

    #[serde(rename = "type", default)]
    node_type: String,

    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    children: Vec<BookmarkNodeDto>,

    #[serde(default)]
    date_added: Option<String>,
}

/// `serde_json::from_str` without the 128-level recursion limit.
///
/// Deep nesting grows the stack in heap segments through `serde_stacker`.
pub fn from_str_unbounded<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Top-level nodes of a JSON bookmark tree.
///
/// Accepts a full `{"roots": {...}}` file (roots in key order) or a single bare node.
pub fn top_level_nodes(raw: &str) -> serde_json::Result<Vec<BookmarkNodeDto>> {
    let top: TopLevelDto = from_str_unbounded(raw)?;
    match top.roots {
        Some(roots) => Ok(roots.into_values().collect()),
        None => Ok(vec![BookmarkNodeDto {
            node_type: top.node_type,
            name: top.name,
            url: top.url,
            children: top.children,
            date_added: top.date_added,
        }]),
    }
}

/// Pre-order walk of a JSON bookmark tree on an owned explicit stack.
pub struct JsonEntities {
    stack: Vec<BookmarkNodeDto>,
    malformed: usize,
}

impl JsonEntities {
    pub fn new(top_level: Vec<BookmarkNodeDto>) -> Self {
        let mut stack = top_level;
        stack.reverse();
        Self {
            stack,
            malformed: 0,
        }
    }

    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        Ok(Self::new(top_level_nodes(raw)?))
    }

    /// `url` nodes dropped so far because their `url` was missing or empty.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }
}

impl Iterator for JsonEntities {
    type Item = ParsedEntity;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(mut node) = self.stack.pop() {
            let name = node.name.take().unwrap_or_default();

            match node.node_type.as_str() {
                "folder" => {
                    let children = std::mem::take(&mut node.children);
                    self.stack.extend(children.into_iter().rev());
                    return Some(ParsedEntity::Folder(FolderEntry::new(name.trim())));
                }
                "url" => match node.url.take() {
                    Some(url) if !url.is_empty() => {
                        return Some(ParsedEntity::Bookmark(BookmarkEntry::new(url, name.trim())));
                    }
                    _ => {
                        self.malformed += 1;
                        debug!(name = %name, "dropping url node without url");
                    }
                },
                other => {
                    debug!(node_type = %other, "skipping node of unknown type");
                }
            }
        }
        None
    }
}

pub async fn read_bookmarks_file(path: &Path) -> Result<BookmarksFileDto> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let dto: BookmarksFileDto = from_str_unbounded(&raw)
        .with_context(|| format!("parsing bookmarks JSON: {}", path.display()))?;
    Ok(dto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FILE: &str = r#"{
      "checksum": "x",
      "version": 1,
      "roots": {
        "other": {"type": "folder", "name": "Other", "children": [
          {"type": "url", "name": "C", "url": "http://c.com"}
        ]},
        "bookmark_bar": {"type": "folder", "name": "Bar", "children": [
          {"type": "folder", "name": " Work ", "children": [
            {"type": "url", "name": "A", "url": "http://a.com"},
            {"type": "url", "name": "broken"},
            {"type": "separator", "children": [{"type": "url", "url": "http://hidden"}]}
          ]},
          {"type": "url", "name": "B", "url": "http://b.com", "date_added": "13300000000000000"}
        ]}
      }
    }"#;

    #[test]
    fn walks_roots_in_key_order_pre_order() {
        let mut it = JsonEntities::parse(FILE).expect("parse");
        let got: Vec<ParsedEntity> = it.by_ref().collect();
        assert_eq!(
            got,
            vec![
                ParsedEntity::Folder(FolderEntry::new("Bar")),
                ParsedEntity::Folder(FolderEntry::new("Work")),
                ParsedEntity::Bookmark(BookmarkEntry::new("http://a.com", "A")),
                ParsedEntity::Bookmark(BookmarkEntry::new("http://b.com", "B")),
                ParsedEntity::Folder(FolderEntry::new("Other")),
                ParsedEntity::Bookmark(BookmarkEntry::new("http://c.com", "C")),
            ]
        );
        assert_eq!(it.malformed_count(), 1);
    }

    #[test]
    fn accepts_bare_node() {
        let got: Vec<_> =
            JsonEntities::parse(r#"{"type":"url","name":"x","url":"ftp://x"}"#)
                .expect("parse")
                .collect();
        assert_eq!(
            got,
            vec![ParsedEntity::Bookmark(BookmarkEntry::new("ftp://x", "x"))]
        );
    }

    #[test]
    fn rejects_non_json() {
        assert!(JsonEntities::parse("<html>").is_err());
    }

    #[test]
    fn add_date_truncates_and_defaults() {
        let mut node = BookmarkNodeDto::default();
        node.date_added = Some("13300000000000000".to_string());
        assert_eq!(node.add_date(), "1330000000");
        assert_eq!(BookmarkNodeDto::default().add_date(), "0");
    }

    #[test]
    fn deep_json_nesting_is_walked() {
        let depth = 20_000;
        let mut raw = String::new();
        for _ in 0..depth {
            raw.push_str(r#"{"type":"folder","name":"f","children":["#);
        }
        raw.push_str(r#"{"type":"url","name":"leaf","url":"http://leaf"}"#);
        for _ in 0..depth {
            raw.push_str("]}");
        }

        let got: Vec<_> = JsonEntities::parse(&raw).expect("parse").collect();
        assert_eq!(got.len(), depth + 1);
        assert_eq!(
            got.last(),
            Some(&ParsedEntity::Bookmark(BookmarkEntry::new("http://leaf", "leaf")))
        );
    }

    #[test]
    fn deep_tree_drops_without_recursion() {
        let mut node = BookmarkNodeDto::default();
        for _ in 0..200_000 {
            let mut parent = BookmarkNodeDto::default();
            parent.children.push(node);
            node = parent;
        }
        drop(node);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(JsonEntities::parse(r#"{"type":"url","url":"http://a"} x"#).is_err());
    }

    #[tokio::test]
    async fn read_keeps_roots_and_ignores_other_keys() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("Bookmarks");
        std::fs::write(&path, r#"{"checksum":"x","roots":{"bookmark_bar":{"type":"folder","name":"bar","guid":"g"}},"version":1,"sync_metadata":"abc"}"#)
            .expect("write");

        let dto = read_bookmarks_file(&path)
            .await
            .expect("read");
        assert_eq!(dto.roots.len(), 1);
        assert_eq!(
            dto.roots.get("bookmark_bar").and_then(|n| n.name.as_deref()),
            Some("bar")
        );
    }
}
