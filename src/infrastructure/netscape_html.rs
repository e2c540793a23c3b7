//! Netscape bookmark-file extractor: an anchor/heading state machine over [`TagStream`].

use crate::domain::model::{BookmarkEntry, FolderEntry, ParsedEntity};
use crate::infrastructure::tag_stream::{strip_markup, TagEvent, TagStream};
use tracing::debug;

/// Lazily yields one entity per closed `<a>` (with a non-empty `href`) or `<h3>`.
///
/// Anchors or headings still open at end of input yield nothing.
pub struct NetscapeEntities<'a> {
    tags: TagStream<'a>,
    in_anchor: bool,
    in_heading: bool,
    current_url: String,
    current_title: String,
    current_folder: String,
    malformed: usize,
}

impl<'a> NetscapeEntities<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tags: TagStream::new(input),
            in_anchor: false,
            in_heading: false,
            current_url: String::new(),
            current_title: String::new(),
            current_folder: String::new(),
            malformed: 0,
        }
    }

    /// Link records dropped so far because their `href` was missing or empty.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    fn close_anchor(&mut self) -> Option<ParsedEntity> {
        let url = std::mem::take(&mut self.current_url);
        let title = std::mem::take(&mut self.current_title);
        self.in_anchor = false;

        if url.is_empty() {
            self.malformed += 1;
            debug!(title = %title.trim(), "dropping link without href");
            return None;
        }
        Some(ParsedEntity::Bookmark(BookmarkEntry::new(
            url,
            strip_markup(&title).trim(),
        )))
    }

    fn close_heading(&mut self) -> ParsedEntity {
        let name = std::mem::take(&mut self.current_folder);
        self.in_heading = false;
        ParsedEntity::Folder(FolderEntry::new(strip_markup(&name).trim()))
    }
}

impl Iterator for NetscapeEntities<'_> {
    type Item = ParsedEntity;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = self.tags.next()?;
            match event {
                TagEvent::StartTag { ref name, .. } if name == "a" => {
                    self.in_anchor = true;
                    self.current_url = event.attr("href").unwrap_or_default().to_string();
                    self.current_title.clear();
                }
                TagEvent::StartTag { ref name, .. } if name == "h3" => {
                    self.in_heading = true;
                    self.current_folder.clear();
                }
                TagEvent::Text(data) => {
                    if self.in_anchor {
                        self.current_title.push_str(data);
                    } else if self.in_heading {
                        self.current_folder.push_str(data);
                    }
                }
                TagEvent::EndTag { ref name } if name == "a" && self.in_anchor => {
                    if let Some(entity) = self.close_anchor() {
                        return Some(entity);
                    }
                }
                TagEvent::EndTag { ref name } if name == "h3" && self.in_heading => {
                    return Some(self.close_heading());
                }
                _ => {}
            }
        }
    }
}
