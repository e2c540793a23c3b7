use crate::domain::model::SourceFormat;
use crate::usecase::stats::RunStats;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AppEvent {
    PhaseStarted {
        name: String,
    },
    PhaseFinished {
        name: String,
    },

    InputParsed {
        source: String,
        format: SourceFormat,
        bookmarks: usize,
        unique_bookmarks: usize,
        folders: usize,
        unique_folders: usize,
        filtered: usize,
        malformed: usize,
    },

    InputFailed {
        source: String,
        reason: String,
    },

    ComparisonComputed {
        operation: String,
        inputs: usize,
        bookmarks: usize,
        folders: usize,
    },

    DuplicatesFound {
        source: String,
        groups: usize,
        removed: usize,
    },

    FileWritten {
        path: String,
    },

    Finished {
        stats: RunStats,
    },
}
