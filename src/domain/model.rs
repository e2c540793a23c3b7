use crate::domain::config::NormalizationConfig;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// A link record closed by the parser. `url` is the raw `href` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BookmarkEntry {
    pub url: String,
    pub title: String,
}

impl BookmarkEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// A folder heading closed by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FolderEntry {
    pub name: String,
}

impl FolderEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEntity {
    Bookmark(BookmarkEntry),
    Folder(FolderEntry),
}

/// Comparison key produced by normalization.
///
/// Ordering is structural: URL-only keys order by URL, URL+title keys order by
/// URL first and title second. Reports rely on this for reproducible output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum CanonicalKey {
    Url(String),
    UrlTitle { url: String, title: String },
}

impl CanonicalKey {
    pub fn url(&self) -> &str {
        match self {
            CanonicalKey::Url(url) => url,
            CanonicalKey::UrlTitle { url, .. } => url,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            CanonicalKey::Url(_) => None,
            CanonicalKey::UrlTitle { title, .. } => Some(title.as_str()),
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalKey::Url(url) => write!(f, "{url}"),
            CanonicalKey::UrlTitle { url, title } => write!(f, "[ {title} ] {url}"),
        }
    }
}

/// Outcome of running one bookmark through the normalization rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Accepted(CanonicalKey),
    Rejected,
}

impl Normalized {
    pub fn into_key(self) -> Option<CanonicalKey> {
        match self {
            Normalized::Accepted(key) => Some(key),
            Normalized::Rejected => None,
        }
    }
}

/// One accepted bookmark occurrence in parse order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub key: CanonicalKey,
    pub entry: BookmarkEntry,
}

/// The normalized content of one input file. Read-only once built.
#[derive(Debug, Clone)]
pub struct Collection {
    pub(crate) source: String,
    pub(crate) format: SourceFormat,
    pub(crate) config: NormalizationConfig,
    pub(crate) bookmark_keys: BTreeSet<CanonicalKey>,
    pub(crate) occurrences: Option<Vec<Occurrence>>,
    pub(crate) folder_names: BTreeSet<String>,
    pub(crate) total_bookmark_count: usize,
    pub(crate) total_folder_count: usize,
    pub(crate) filtered_count: usize,
    pub(crate) malformed_count: usize,
}

impl Collection {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    pub fn bookmark_keys(&self) -> &BTreeSet<CanonicalKey> {
        &self.bookmark_keys
    }

    /// Parse-ordered occurrences; `None` unless the builder was asked to track them.
    pub fn occurrences(&self) -> Option<&[Occurrence]> {
        self.occurrences.as_deref()
    }

    pub fn folder_names(&self) -> &BTreeSet<String> {
        &self.folder_names
    }

    /// Accepted bookmark occurrences, duplicates included, filtered ones excluded.
    pub fn total_bookmark_count(&self) -> usize {
        self.total_bookmark_count
    }

    pub fn total_folder_count(&self) -> usize {
        self.total_folder_count
    }

    /// Bookmarks rejected by the protocol filter.
    pub fn filtered_count(&self) -> usize {
        self.filtered_count
    }

    /// Link records dropped by the parser (no href, empty url node).
    pub fn malformed_count(&self) -> usize {
        self.malformed_count
    }
}

/// First-seen deduplication cluster: `kept` is the earliest occurrence of `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub key: CanonicalKey,
    pub kept: BookmarkEntry,
    pub removed: Vec<BookmarkEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Html,
    JsonTree,
}

impl SourceFormat {
    /// `.json` files are JSON trees; otherwise sniff for a leading `{`, else HTML.
    pub fn detect(path: &Path, content: &str) -> Self {
        let by_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if by_ext || content.trim_start().starts_with('{') {
            SourceFormat::JsonTree
        } else {
            SourceFormat::Html
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Html => f.write_str("html"),
            SourceFormat::JsonTree => f.write_str("json-tree"),
        }
    }
}
