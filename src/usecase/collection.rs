use crate::domain::config::NormalizationConfig;
use crate::domain::error::CoreError;
use crate::domain::model::{Collection, Occurrence, ParsedEntity, SourceFormat};
use crate::domain::traits::KeyNormalizer;
use crate::infrastructure::parser::parse;
use std::collections::BTreeSet;
use tracing::debug;

/// Folds parsed entities into a [`Collection`].
pub struct CollectionBuilder<'n> {
    normalizer: &'n dyn KeyNormalizer,
    collection: Collection,
}

impl<'n> CollectionBuilder<'n> {
    pub fn new(
        source: impl Into<String>,
        format: SourceFormat,
        config: NormalizationConfig,
        normalizer: &'n dyn KeyNormalizer,
    ) -> Self {
        Self {
            normalizer,
            collection: Collection {
                source: source.into(),
                format,
                config,
                bookmark_keys: BTreeSet::new(),
                occurrences: None,
                folder_names: BTreeSet::new(),
                total_bookmark_count: 0,
                total_folder_count: 0,
                filtered_count: 0,
                malformed_count: 0,
            },
        }
    }

    /// Keep every accepted occurrence in parse order (needed for dedup).
    pub fn track_occurrences(mut self) -> Self {
        self.collection.occurrences.get_or_insert_with(Vec::new);
        self
    }

    pub fn push(&mut self, entity: ParsedEntity) {
        let c = &mut self.collection;
        match entity {
            ParsedEntity::Bookmark(entry) => match self.normalizer.normalize(&entry, &c.config).into_key() {
                Some(key) => {
                    c.total_bookmark_count += 1;
                    if let Some(occ) = c.occurrences.as_mut() {
                        occ.push(Occurrence {
                            key: key.clone(),
                            entry,
                        });
                    }
                    c.bookmark_keys.insert(key);
                }
                None => c.filtered_count += 1,
            },
            ParsedEntity::Folder(folder) => {
                c.total_folder_count += 1;
                let name = self.normalizer.normalize_folder_name(&folder.name, &c.config);
                if !name.is_empty() {
                    c.folder_names.insert(name);
                }
            }
        }
    }

    pub fn record_malformed(&mut self, count: usize) {
        self.collection.malformed_count += count;
    }

    pub fn finish(self) -> Collection {
        let c = self.collection;
        debug!(
            source = %c.source,
            bookmarks = c.total_bookmark_count,
            unique_bookmarks = c.bookmark_keys.len(),
            folders = c.total_folder_count,
            unique_folders = c.folder_names.len(),
            filtered = c.filtered_count,
            malformed = c.malformed_count,
            "collection built"
        );
        c
    }
}

impl Extend<ParsedEntity> for CollectionBuilder<'_> {
    fn extend<T: IntoIterator<Item = ParsedEntity>>(&mut self, iter: T) {
        for entity in iter {
            self.push(entity);
        }
    }
}

/// Builds a collection from an already-parsed entity sequence.
pub fn build_collection(
    source: impl Into<String>,
    format: SourceFormat,
    entities: impl IntoIterator<Item = ParsedEntity>,
    config: &NormalizationConfig,
    normalizer: &dyn KeyNormalizer,
) -> Collection {
    let mut builder = CollectionBuilder::new(source, format, config.clone(), normalizer);
    builder.extend(entities);
    builder.finish()
}

/// Parses `text` and builds its collection, carrying over the parser's malformed count.
pub fn collection_from_text(
    source: &str,
    text: &str,
    format: SourceFormat,
    config: &NormalizationConfig,
    normalizer: &dyn KeyNormalizer,
    track_occurrences: bool,
) -> Result<Collection, CoreError> {
    let mut stream = parse(source, text, format)?;
    let mut builder = CollectionBuilder::new(source, format, config.clone(), normalizer);
    if track_occurrences {
        builder = builder.track_occurrences();
    }
    builder.extend(stream.by_ref());
    builder.record_malformed(stream.malformed_count());
    Ok(builder.finish())
}
