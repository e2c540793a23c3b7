use crate::domain::error::CoreError;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Whole-file UTF-8 read; any failure is `InputUnreadable`.
pub async fn read_source(path: &Path) -> Result<String, CoreError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::unreadable(path.display().to_string(), e))
}

/// Writes `contents`, creating missing parent directories.
pub async fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Distinct files, sorted.
    pub files: Vec<PathBuf>,
    /// Files named more than once, with how often.
    pub repeated: Vec<(PathBuf, usize)>,
    /// Inputs that were not usable, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Expands files and directories (non-recursively) into distinct `.<ext>` files.
pub async fn discover_files(targets: &[PathBuf], ext: &str) -> Discovery {
    let mut counts: BTreeMap<PathBuf, usize> = BTreeMap::new();
    let mut skipped = Vec::new();

    for target in targets {
        let abs = match fs::canonicalize(target).await {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %target.display(), error = %e, "path does not exist, skipping");
                skipped.push((target.clone(), e.to_string()));
                continue;
            }
        };

        let meta = match fs::metadata(&abs).await {
            Ok(m) => m,
            Err(e) => {
                skipped.push((target.clone(), e.to_string()));
                continue;
            }
        };

        if meta.is_dir() {
            let mut found = 0usize;
            match fs::read_dir(&abs).await {
                Ok(mut entries) => {
                    while let Ok(Some(entry)) = entries.next_entry().await {
                        let p = entry.path();
                        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                        if is_file && has_extension(&p, ext) {
                            *counts.entry(p).or_default() += 1;
                            found += 1;
                        }
                    }
                }
                Err(e) => {
                    skipped.push((target.clone(), e.to_string()));
                    continue;
                }
            }
            if found == 0 {
                warn!(dir = %target.display(), "no .{ext} files in directory");
            }
        } else if has_extension(&abs, ext) {
            *counts.entry(abs).or_default() += 1;
        } else {
            warn!(path = %target.display(), "not a .{ext} file, skipping");
            skipped.push((target.clone(), format!("not a .{ext} file")));
        }
    }

    let repeated: Vec<(PathBuf, usize)> = counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(p, n)| (p.clone(), *n))
        .collect();
    for (p, n) in &repeated {
        warn!(path = %p.display(), times = n, "file named more than once, processing it once");
    }

    Discovery {
        files: counts.into_keys().collect(),
        repeated,
        skipped,
    }
}
