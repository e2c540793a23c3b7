//! Application workflows: read inputs, build collections, run the engine, emit progress.

use crate::domain::config::{KeyMode, NormalizationConfig};
use crate::domain::error::CoreError;
use crate::domain::model::{BookmarkEntry, Collection, SourceFormat};
use crate::domain::traits::KeyNormalizer;
use crate::infrastructure::html_writer::render_tree;
use crate::infrastructure::serde_json_adapter::read_bookmarks_file;
use crate::infrastructure::source_file::read_source;
use crate::usecase::collection::collection_from_text;
use crate::usecase::compare::{diff, intersect, unique_complement};
use crate::usecase::dedup::dedup;
use crate::usecase::event::AppEvent;
use crate::usecase::report::{Analysis, CompareReport, DedupReport, DiffReport};
use crate::usecase::stats::RunStats;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Shared settings for one command invocation.
pub struct Pipeline<'n> {
    pub config: NormalizationConfig,
    /// Overrides per-file format detection.
    pub forced_format: Option<SourceFormat>,
    pub normalizer: &'n dyn KeyNormalizer,
    pub sink: Option<mpsc::Sender<AppEvent>>,
}

/// Dedup report plus what is needed to write the cleaned file.
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub report: DedupReport,
    pub kept: Vec<BookmarkEntry>,
    pub format: SourceFormat,
}

#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub mode: KeyMode,
    pub outcome: std::result::Result<DedupOutcome, CoreError>,
}

async fn emit(sink: &Option<mpsc::Sender<AppEvent>>, ev: AppEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(ev).await;
    }
}

impl Pipeline<'_> {
    async fn phase<T>(&self, name: &str, body: impl std::future::Future<Output = T>) -> T {
        emit(&self.sink, AppEvent::PhaseStarted { name: name.into() }).await;
        let out = body.await;
        emit(&self.sink, AppEvent::PhaseFinished { name: name.into() }).await;
        out
    }

    fn format_for(&self, path: &Path, text: &str) -> SourceFormat {
        self.forced_format
            .unwrap_or_else(|| SourceFormat::detect(path, text))
    }

    async fn build(
        &self,
        path: &Path,
        text: &str,
        config: &NormalizationConfig,
        track_occurrences: bool,
        stats: &mut RunStats,
    ) -> std::result::Result<Collection, CoreError> {
        let source = path.display().to_string();
        let format = self.format_for(path, text);
        let c = collection_from_text(
            &source,
            text,
            format,
            config,
            self.normalizer,
            track_occurrences,
        )?;

        stats.bookmarks_seen += c.total_bookmark_count();
        stats.folders_seen += c.total_folder_count();
        stats.filtered += c.filtered_count();
        stats.malformed += c.malformed_count();

        emit(
            &self.sink,
            AppEvent::InputParsed {
                source,
                format,
                bookmarks: c.total_bookmark_count(),
                unique_bookmarks: c.bookmark_keys().len(),
                folders: c.total_folder_count(),
                unique_folders: c.folder_names().len(),
                filtered: c.filtered_count(),
                malformed: c.malformed_count(),
            },
        )
        .await;
        Ok(c)
    }

    async fn load(
        &self,
        path: &Path,
        track_occurrences: bool,
        stats: &mut RunStats,
    ) -> std::result::Result<Collection, CoreError> {
        let text = read_source(path).await?;
        stats.inputs_read += 1;
        self.build(path, &text, &self.config, track_occurrences, stats)
            .await
    }

    async fn load_all(&self, paths: &[PathBuf], stats: &mut RunStats) -> Result<Vec<Collection>> {
        let mut out = Vec::with_capacity(paths.len());
        for p in paths {
            out.push(self.load(p, false, stats).await?);
        }
        Ok(out)
    }

    pub async fn written(&self, path: &Path) {
        emit(
            &self.sink,
            AppEvent::FileWritten {
                path: path.display().to_string(),
            },
        )
        .await;
    }

    /// Last event of a run, sent once every output is on disk.
    pub async fn finish(&self, stats: &RunStats) {
        emit(
            &self.sink,
            AppEvent::Finished {
                stats: stats.clone(),
            },
        )
        .await;
    }

    pub async fn diff(&self, a: &Path, b: &Path) -> Result<(DiffReport, RunStats)> {
        let mut stats = RunStats::default();
        let paths = [a.to_path_buf(), b.to_path_buf()];
        let cs = self.phase("parse", self.load_all(&paths, &mut stats)).await?;
        let (ca, cb) = (&cs[0], &cs[1]);

        let result = self.phase("diff", async { diff(ca, cb) }).await?;
        emit(
            &self.sink,
            AppEvent::ComparisonComputed {
                operation: "diff".into(),
                inputs: 2,
                bookmarks: result.bookmarks.only_a.len() + result.bookmarks.only_b.len(),
                folders: result.folders.only_a.len() + result.folders.only_b.len(),
            },
        )
        .await;

        Ok((DiffReport::new(ca, cb, result), stats))
    }

    pub async fn compare(
        &self,
        paths: &[PathBuf],
        analysis: Analysis,
    ) -> Result<(CompareReport, RunStats)> {
        if paths.len() < 2 {
            return Err(CoreError::NotEnoughInputs {
                needed: 2,
                got: paths.len(),
            }
            .into());
        }

        let mut stats = RunStats::default();
        let cs = self.phase("parse", self.load_all(paths, &mut stats)).await?;

        let intersection = if analysis.wants_intersection() {
            let i = self.phase("intersection", async { intersect(&cs) }).await?;
            emit(
                &self.sink,
                AppEvent::ComparisonComputed {
                    operation: "intersection".into(),
                    inputs: cs.len(),
                    bookmarks: i.common_bookmarks.len(),
                    folders: i.common_folders.len(),
                },
            )
            .await;
            Some(i)
        } else {
            None
        };

        let unique = if analysis.wants_unique() {
            let u = self.phase("unique", async { unique_complement(&cs) }).await?;
            emit(
                &self.sink,
                AppEvent::ComparisonComputed {
                    operation: "unique".into(),
                    inputs: cs.len(),
                    bookmarks: u.iter().map(|s| s.unique_bookmarks.len()).sum(),
                    folders: u.iter().map(|s| s.unique_folders.len()).sum(),
                },
            )
            .await;
            Some(u)
        } else {
            None
        };

        Ok((CompareReport::new(&cs, analysis, intersection, unique), stats))
    }

    async fn dedup_collection(
        &self,
        c: &Collection,
        stats: &mut RunStats,
    ) -> std::result::Result<DedupOutcome, CoreError> {
        let result = dedup(c)?;
        stats.duplicate_groups += result.groups.len();
        stats.duplicates_removed += result.removed_count;
        emit(
            &self.sink,
            AppEvent::DuplicatesFound {
                source: c.source().to_string(),
                groups: result.groups.len(),
                removed: result.removed_count,
            },
        )
        .await;
        Ok(DedupOutcome {
            report: DedupReport::new(c, &result),
            kept: result.kept,
            format: c.format(),
        })
    }

    pub async fn dedup(&self, path: &Path) -> Result<(DedupOutcome, RunStats)> {
        let mut stats = RunStats::default();
        let c = self.phase("parse", self.load(path, true, &mut stats)).await?;
        let outcome = self
            .phase("dedup", self.dedup_collection(&c, &mut stats))
            .await?;
        Ok((outcome, stats))
    }

    /// Reads a JSON bookmark tree and renders it as nested Netscape HTML.
    pub async fn convert(&self, path: &Path, stats: &mut RunStats) -> Result<String> {
        let dto = self
            .phase("convert", read_bookmarks_file(path))
            .await
            .inspect_err(|_| stats.inputs_failed += 1)?;
        stats.inputs_read += 1;
        Ok(render_tree(&dto))
    }

    /// Dedups every file under every mode. A failing file is recorded and the batch moves on.
    pub async fn batch_dedup(&self, files: &[PathBuf], modes: &[KeyMode]) -> (Vec<BatchItem>, RunStats) {
        let mut stats = RunStats::default();
        let mut items = Vec::with_capacity(files.len() * modes.len());

        for (i, path) in files.iter().enumerate() {
            info!(file = %path.display(), index = i + 1, total = files.len(), "batch dedup");
            let text = match read_source(path).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unreadable file");
                    stats.inputs_failed += 1;
                    emit(
                        &self.sink,
                        AppEvent::InputFailed {
                            source: path.display().to_string(),
                            reason: e.to_string(),
                        },
                    )
                    .await;
                    for &mode in modes {
                        items.push(BatchItem {
                            path: path.clone(),
                            mode,
                            outcome: Err(e.clone()),
                        });
                    }
                    continue;
                }
            };
            stats.inputs_read += 1;

            for &mode in modes {
                let config = self.config.clone().with_key_mode(mode);
                let outcome = match self.build(path, &text, &config, true, &mut stats).await {
                    Ok(c) => self.dedup_collection(&c, &mut stats).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = &outcome {
                    warn!(file = %path.display(), mode = %mode, error = %e, "dedup failed");
                    emit(
                        &self.sink,
                        AppEvent::InputFailed {
                            source: path.display().to_string(),
                            reason: e.to_string(),
                        },
                    )
                    .await;
                }
                items.push(BatchItem {
                    path: path.clone(),
                    mode,
                    outcome,
                });
            }
        }

        (items, stats)
    }
}
