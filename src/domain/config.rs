use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Shape of the comparison key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyMode {
    #[default]
    Url,
    UrlTitle,
}

impl KeyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMode::Url => "url",
            KeyMode::UrlTitle => "url-title",
        }
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable rule set threaded through every normalization call.
///
/// Collections are only comparable when they were built from equal configs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub key_mode: KeyMode,
    pub decode_html_entities: bool,
    pub decode_percent_encoding: bool,
    /// Case-insensitive URL prefixes to keep; `None` disables filtering.
    pub filter_protocols: Option<BTreeSet<String>>,
    pub collapse_protocol: bool,
    pub collapse_trailing_slash: bool,
}

pub const DEFAULT_PROTOCOLS: [&str; 3] = ["http", "https", "ftp"];

pub fn default_protocols() -> BTreeSet<String> {
    DEFAULT_PROTOCOLS.iter().map(|p| p.to_string()).collect()
}

impl NormalizationConfig {
    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    pub fn decoding(&self) -> bool {
        self.decode_html_entities || self.decode_percent_encoding
    }
}
