use crate::domain::config::NormalizationConfig;
use crate::domain::model::{BookmarkEntry, Normalized};

/// Turns raw parsed entries into comparison keys.
pub trait KeyNormalizer {
    fn normalize(&self, entry: &BookmarkEntry, config: &NormalizationConfig) -> Normalized;

    /// Folder names go through the same text rules as titles.
    fn normalize_folder_name(&self, name: &str, config: &NormalizationConfig) -> String;
}
