use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub inputs_read: usize,
    pub inputs_failed: usize,
    pub bookmarks_seen: usize,
    pub folders_seen: usize,
    pub filtered: usize,
    pub malformed: usize,
    pub duplicate_groups: usize,
    pub duplicates_removed: usize,
}
