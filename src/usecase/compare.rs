//! Set algebra over collections: pairwise difference, N-way intersection and
//! N-way unique complement. Results are sorted by the natural key order.
//!
//! Keys shared by some but not all inputs appear in neither the intersection nor
//! any unique set.

use crate::domain::error::CoreError;
use crate::domain::model::{CanonicalKey, Collection};
use crate::usecase::validate::ensure_comparable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference<T> {
    pub only_a: Vec<T>,
    pub only_b: Vec<T>,
}

// Derived `Default` would demand `T: Default`, which `CanonicalKey` is not.
impl<T> Default for Difference<T> {
    fn default() -> Self {
        Self {
            only_a: Vec::new(),
            only_b: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub bookmarks: Difference<CanonicalKey>,
    pub folders: Difference<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Intersection {
    pub common_bookmarks: Vec<CanonicalKey>,
    pub common_folders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueSet {
    pub source: String,
    pub unique_bookmarks: Vec<CanonicalKey>,
    pub unique_folders: Vec<String>,
}

/// `a − b`, sorted.
pub fn only_in<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> Vec<T> {
    a.difference(b).cloned().collect()
}

pub fn diff(a: &Collection, b: &Collection) -> Result<DiffResult, CoreError> {
    check_pair(a, b)?;

    let out = DiffResult {
        bookmarks: Difference {
            only_a: only_in(a.bookmark_keys(), b.bookmark_keys()),
            only_b: only_in(b.bookmark_keys(), a.bookmark_keys()),
        },
        folders: Difference {
            only_a: only_in(a.folder_names(), b.folder_names()),
            only_b: only_in(b.folder_names(), a.folder_names()),
        },
    };
    debug!(
        a = %a.source(),
        b = %b.source(),
        only_a = out.bookmarks.only_a.len(),
        only_b = out.bookmarks.only_b.len(),
        "diff computed"
    );
    Ok(out)
}

fn check_pair(a: &Collection, b: &Collection) -> Result<(), CoreError> {
    if a.config() != b.config() {
        return Err(CoreError::ConfigMismatch {
            expected: Box::new(a.config().clone()),
            found: Box::new(b.config().clone()),
            input: b.source().to_string(),
        });
    }
    Ok(())
}

fn intersect_sets<'c, T: Ord + Clone + 'c>(
    mut sets: impl Iterator<Item = &'c BTreeSet<T>>,
) -> Vec<T> {
    let Some(first) = sets.next() else {
        return Vec::new();
    };
    let mut acc: BTreeSet<T> = first.clone();
    for s in sets {
        acc.retain(|k| s.contains(k));
        if acc.is_empty() {
            break;
        }
    }
    acc.into_iter().collect()
}

pub fn intersect(collections: &[Collection]) -> Result<Intersection, CoreError> {
    ensure_comparable(collections, 1)?;
    let out = Intersection {
        common_bookmarks: intersect_sets(collections.iter().map(Collection::bookmark_keys)),
        common_folders: intersect_sets(collections.iter().map(Collection::folder_names)),
    };
    debug!(
        inputs = collections.len(),
        common_bookmarks = out.common_bookmarks.len(),
        common_folders = out.common_folders.len(),
        "intersection computed"
    );
    Ok(out)
}

/// Keys that occur in exactly one of the sets, tagged with that set's index.
fn exclusive_members<'c, T: Ord + Clone + 'c>(
    sets: impl Iterator<Item = &'c BTreeSet<T>>,
    n: usize,
) -> Vec<Vec<T>> {
    let mut owner: BTreeMap<&T, Option<usize>> = BTreeMap::new();
    for (i, set) in sets.enumerate() {
        for k in set {
            owner
                .entry(k)
                .and_modify(|o| *o = None)
                .or_insert(Some(i));
        }
    }

    let mut out: Vec<Vec<T>> = vec![Vec::new(); n];
    for (k, o) in owner {
        if let Some(i) = o {
            out[i].push(k.clone());
        }
    }
    out
}

/// Per input, in input order: keys no other input has.
pub fn unique_complement(collections: &[Collection]) -> Result<Vec<UniqueSet>, CoreError> {
    ensure_comparable(collections, 1)?;
    let n = collections.len();
    let bookmarks = exclusive_members(collections.iter().map(Collection::bookmark_keys), n);
    let folders = exclusive_members(collections.iter().map(Collection::folder_names), n);

    let out: Vec<UniqueSet> = collections
        .iter()
        .zip(bookmarks)
        .zip(folders)
        .map(|((c, unique_bookmarks), unique_folders)| UniqueSet {
            source: c.source().to_string(),
            unique_bookmarks,
            unique_folders,
        })
        .collect();
    debug!(inputs = n, "unique complement computed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{KeyMode, NormalizationConfig};
    use crate::domain::model::{BookmarkEntry, FolderEntry, ParsedEntity, SourceFormat};
    use crate::infrastructure::url_normalizer::RuleNormalizer;
    use crate::usecase::collection::build_collection;

    fn coll(source: &str, urls: &[&str], folders: &[&str]) -> Collection {
        let mut entities: Vec<ParsedEntity> = urls
            .iter()
            .map(|u| ParsedEntity::Bookmark(BookmarkEntry::new(*u, "")))
            .collect();
        entities.extend(folders.iter().map(|f| ParsedEntity::Folder(FolderEntry::new(*f))));
        build_collection(
            source,
            SourceFormat::Html,
            entities,
            &NormalizationConfig::default(),
            &RuleNormalizer,
        )
    }

    fn urls(keys: &[CanonicalKey]) -> Vec<&str> {
        keys.iter().map(CanonicalKey::url).collect()
    }

    #[test]
    fn diff_is_sorted_and_complementary() {
        let a = coll("a", &["http://c", "http://a", "http://both"], &[]);
        let b = coll("b", &["http://both", "http://b"], &[]);
        let d = diff(&a, &b).expect("diff");
        assert_eq!(urls(&d.bookmarks.only_a), vec!["http://a", "http://c"]);
        assert_eq!(urls(&d.bookmarks.only_b), vec!["http://b"]);
    }

    #[test]
    fn diff_rejects_mismatched_configs() {
        let a = coll("a", &[], &[]);
        let b = build_collection(
            "b",
            SourceFormat::Html,
            Vec::new(),
            &NormalizationConfig::default().with_key_mode(KeyMode::UrlTitle),
            &RuleNormalizer,
        );
        assert!(matches!(diff(&a, &b), Err(CoreError::ConfigMismatch { .. })));
    }

    #[test]
    fn folder_scenario() {
        let f1 = coll("1", &[], &["Work", "Personal"]);
        let f2 = coll("2", &[], &["Work", "Travel"]);
        let d = diff(&f1, &f2).expect("diff");
        assert_eq!(d.folders.only_a, vec!["Personal".to_string()]);
        assert_eq!(d.folders.only_b, vec!["Travel".to_string()]);
        let i = intersect(&[f1, f2]).expect("intersect");
        assert_eq!(i.common_folders, vec!["Work".to_string()]);
    }

    #[test]
    fn partial_overlap_is_in_no_unique_set() {
        let a = coll("a", &["http://ab", "http://all", "http://a"], &[]);
        let b = coll("b", &["http://ab", "http://all"], &[]);
        let c = coll("c", &["http://all", "http://c"], &[]);
        let u = unique_complement(&[a, b, c]).expect("unique");
        assert_eq!(u.len(), 3);
        assert_eq!(urls(&u[0].unique_bookmarks), vec!["http://a"]);
        assert!(u[1].unique_bookmarks.is_empty());
        assert_eq!(urls(&u[2].unique_bookmarks), vec!["http://c"]);
        assert_eq!(u[2].source, "c");
    }

    #[test]
    fn empty_inputs_yield_empty_results() {
        let a = coll("a", &[], &[]);
        let b = coll("b", &[], &[]);
        assert_eq!(diff(&a, &b).expect("diff"), DiffResult::default());
        assert_eq!(
            intersect(&[a.clone(), b.clone()]).expect("intersect"),
            Intersection::default()
        );
        let u = unique_complement(&[a, b]).expect("unique");
        assert!(u.iter().all(|s| s.unique_bookmarks.is_empty() && s.unique_folders.is_empty()));
    }

    #[test]
    fn no_collections_is_an_error() {
        assert!(matches!(
            intersect(&[]),
            Err(CoreError::NotEnoughInputs { needed: 1, got: 0 })
        ));
    }
}
