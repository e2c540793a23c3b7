use crate::domain::error::CoreError;
use crate::domain::model::{BookmarkEntry, CanonicalKey, Collection, DuplicateGroup};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupResult {
    /// First occurrence of every key, in parse order.
    pub kept: Vec<BookmarkEntry>,
    /// Largest clusters first; ties by key.
    pub groups: Vec<DuplicateGroup>,
    pub total_bookmark_count: usize,
    pub remaining_count: usize,
    pub removed_count: usize,
    pub filtered_count: usize,
}

/// First-seen deduplication over the collection's parse-ordered occurrences.
pub fn dedup(collection: &Collection) -> Result<DedupResult, CoreError> {
    let occurrences = collection
        .occurrences()
        .ok_or_else(|| CoreError::OccurrencesNotTracked {
            input: collection.source().to_string(),
        })?;

    let mut kept: Vec<BookmarkEntry> = Vec::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    // key -> index into `groups`
    let mut seen: HashMap<&CanonicalKey, usize> = HashMap::new();

    for occ in occurrences {
        match seen.get(&occ.key) {
            Some(&g) => groups[g].removed.push(occ.entry.clone()),
            None => {
                seen.insert(&occ.key, groups.len());
                kept.push(occ.entry.clone());
                groups.push(DuplicateGroup {
                    key: occ.key.clone(),
                    kept: occ.entry.clone(),
                    removed: Vec::new(),
                });
            }
        }
    }

    groups.retain(|g| !g.removed.is_empty());
    groups.sort_by(|a, b| {
        Reverse(a.removed.len())
            .cmp(&Reverse(b.removed.len()))
            .then_with(|| a.key.cmp(&b.key))
    });

    let removed_count = groups.iter().map(|g| g.removed.len()).sum();
    let result = DedupResult {
        remaining_count: kept.len(),
        kept,
        groups,
        total_bookmark_count: collection.total_bookmark_count(),
        removed_count,
        filtered_count: collection.filtered_count(),
    };
    debug!(
        source = %collection.source(),
        groups = result.groups.len(),
        removed = result.removed_count,
        remaining = result.remaining_count,
        "dedup computed"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{KeyMode, NormalizationConfig};
    use crate::domain::model::SourceFormat;
    use crate::infrastructure::url_normalizer::RuleNormalizer;
    use crate::usecase::collection::collection_from_text;

    fn tracked(html: &str, cfg: &NormalizationConfig) -> Collection {
        collection_from_text("t.html", html, SourceFormat::Html, cfg, &RuleNormalizer, true)
            .expect("build")
    }

    #[test]
    fn trailing_slash_duplicates_form_one_group() {
        let cfg = NormalizationConfig {
            collapse_trailing_slash: true,
            ..NormalizationConfig::default()
        };
        let c = tracked(r#"<a href="http://x.com/">A</a><a href="http://x.com">A</a>"#, &cfg);
        assert_eq!(c.bookmark_keys().len(), 1);

        let r = dedup(&c).expect("dedup");
        assert_eq!(r.groups.len(), 1);
        assert_eq!(r.groups[0].kept.url, "http://x.com/");
        assert_eq!(r.groups[0].removed, vec![BookmarkEntry::new("http://x.com", "A")]);
        assert_eq!(r.remaining_count, 1);
        assert_eq!(r.removed_count, 1);
    }

    #[test]
    fn groups_sorted_by_cluster_size_then_key() {
        let html = r#"
            <a href="http://b">1</a><a href="http://b">2</a>
            <a href="http://c">1</a><a href="http://c">2</a><a href="http://c">3</a>
            <a href="http://a">1</a><a href="http://a">2</a>
            <a href="http://solo">1</a>"#;
        let r = dedup(&tracked(html, &NormalizationConfig::default())).expect("dedup");
        let order: Vec<_> = r.groups.iter().map(|g| g.key.url()).collect();
        assert_eq!(order, vec!["http://c", "http://a", "http://b"]);
        let kept: Vec<_> = r.kept.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(kept, vec!["http://b", "http://c", "http://a", "http://solo"]);
    }

    #[test]
    fn url_title_mode_keeps_distinct_titles() {
        let cfg = NormalizationConfig::default().with_key_mode(KeyMode::UrlTitle);
        let r = dedup(&tracked(
            r#"<a href="u">A</a><a href="u">B</a><a href="u"> A </a>"#,
            &cfg,
        ))
        .expect("dedup");
        assert_eq!(r.remaining_count, 2);
        assert_eq!(r.groups.len(), 1);
        assert_eq!(r.groups[0].kept.title, "A");
    }

    #[test]
    fn conservation_holds() {
        let html = r#"<a href="a">x</a><a href="b">x</a><a href="a">y</a><a href="a">z</a>"#;
        let c = tracked(html, &NormalizationConfig::default());
        let r = dedup(&c).expect("dedup");
        let removed: usize = r.groups.iter().map(|g| g.removed.len()).sum();
        assert_eq!(r.kept.len() + removed, c.total_bookmark_count());
    }

    #[test]
    fn untracked_collection_is_rejected() {
        let c = collection_from_text(
            "u.html",
            "",
            SourceFormat::Html,
            &NormalizationConfig::default(),
            &RuleNormalizer,
            false,
        )
        .expect("build");
        assert!(matches!(dedup(&c), Err(CoreError::OccurrencesNotTracked { .. })));
    }
}
