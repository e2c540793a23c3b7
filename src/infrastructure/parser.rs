use crate::domain::error::CoreError;
use crate::domain::model::{ParsedEntity, SourceFormat};
use crate::infrastructure::netscape_html::NetscapeEntities;
use crate::infrastructure::serde_json_adapter::JsonEntities;

/// Lazy entity sequence over either supported input format.
pub enum EntityStream<'a> {
    Html(NetscapeEntities<'a>),
    Json(JsonEntities),
}

impl EntityStream<'_> {
    /// Link records the parser dropped so far.
    pub fn malformed_count(&self) -> usize {
        match self {
            EntityStream::Html(it) => it.malformed_count(),
            EntityStream::Json(it) => it.malformed_count(),
        }
    }
}

impl Iterator for EntityStream<'_> {
    type Item = ParsedEntity;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EntityStream::Html(it) => it.next(),
            EntityStream::Json(it) => it.next(),
        }
    }
}

/// `source` only labels errors. HTML never fails; JSON fails when the document is not a bookmark tree.
pub fn parse<'a>(
    source: &str,
    input: &'a str,
    format: SourceFormat,
) -> Result<EntityStream<'a>, CoreError> {
    match format {
        SourceFormat::Html => Ok(EntityStream::Html(NetscapeEntities::new(input))),
        SourceFormat::JsonTree => JsonEntities::parse(input)
            .map(EntityStream::Json)
            .map_err(|e| CoreError::unreadable(source, format!("invalid bookmark JSON: {e}"))),
    }
}
