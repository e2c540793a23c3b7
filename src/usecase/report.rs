//! Structured results handed to renderers. Nothing here is prose or time-dependent.

use crate::domain::config::NormalizationConfig;
use crate::domain::model::{CanonicalKey, Collection, DuplicateGroup, SourceFormat};
use crate::usecase::compare::{DiffResult, Difference, Intersection, UniqueSet};
use crate::usecase::dedup::DedupResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub format: SourceFormat,
    pub total_bookmarks: usize,
    pub unique_bookmarks: usize,
    pub total_folders: usize,
    pub unique_folders: usize,
    pub filtered: usize,
    pub malformed: usize,
}

impl From<&Collection> for SourceSummary {
    fn from(c: &Collection) -> Self {
        Self {
            source: c.source().to_string(),
            format: c.format(),
            total_bookmarks: c.total_bookmark_count(),
            unique_bookmarks: c.bookmark_keys().len(),
            total_folders: c.total_folder_count(),
            unique_folders: c.folder_names().len(),
            filtered: c.filtered_count(),
            malformed: c.malformed_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    Intersection,
    Unique,
    All,
}

impl Analysis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Analysis::Intersection => "intersection",
            Analysis::Unique => "unique",
            Analysis::All => "all",
        }
    }

    pub fn wants_intersection(&self) -> bool {
        matches!(self, Analysis::Intersection | Analysis::All)
    }

    pub fn wants_unique(&self) -> bool {
        matches!(self, Analysis::Unique | Analysis::All)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub config: NormalizationConfig,
    pub a: SourceSummary,
    pub b: SourceSummary,
    pub bookmarks: Difference<CanonicalKey>,
    pub folders: Difference<String>,
}

impl DiffReport {
    pub fn new(a: &Collection, b: &Collection, result: DiffResult) -> Self {
        Self {
            config: a.config().clone(),
            a: a.into(),
            b: b.into(),
            bookmarks: result.bookmarks,
            folders: result.folders,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IntersectionReport {
    pub inputs: usize,
    pub common_bookmarks: Vec<CanonicalKey>,
    pub common_folders: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniqueReport {
    pub per_source: Vec<UniqueSet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub config: NormalizationConfig,
    pub analysis: Analysis,
    pub sources: Vec<SourceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersection: Option<IntersectionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<UniqueReport>,
}

impl CompareReport {
    pub fn new(
        collections: &[Collection],
        analysis: Analysis,
        intersection: Option<Intersection>,
        unique: Option<Vec<UniqueSet>>,
    ) -> Self {
        Self {
            config: collections
                .first()
                .map(|c| c.config().clone())
                .unwrap_or_default(),
            analysis,
            sources: collections.iter().map(SourceSummary::from).collect(),
            intersection: intersection.map(|i| IntersectionReport {
                inputs: collections.len(),
                common_bookmarks: i.common_bookmarks,
                common_folders: i.common_folders,
            }),
            unique: unique.map(|per_source| UniqueReport { per_source }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    pub config: NormalizationConfig,
    pub source: SourceSummary,
    pub total_bookmark_count: usize,
    pub remaining_count: usize,
    pub removed_count: usize,
    pub filtered_count: usize,
    pub groups: Vec<DuplicateGroup>,
}

impl DedupReport {
    pub fn new(collection: &Collection, result: &DedupResult) -> Self {
        Self {
            config: collection.config().clone(),
            source: collection.into(),
            total_bookmark_count: result.total_bookmark_count,
            remaining_count: result.remaining_count,
            removed_count: result.removed_count,
            filtered_count: result.filtered_count,
            groups: result.groups.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Diff(DiffReport),
    Compare(CompareReport),
    Dedup(DedupReport),
}
