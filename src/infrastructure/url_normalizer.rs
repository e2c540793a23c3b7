use crate::domain::config::{KeyMode, NormalizationConfig};
use crate::domain::model::{BookmarkEntry, CanonicalKey, Normalized};
use crate::domain::traits::KeyNormalizer;
use percent_encoding::percent_decode_str;

/// Applies the rule set in a fixed order:
/// entity decode, percent decode, protocol filter, protocol collapse,
/// trailing-slash collapse, title trim.
pub struct RuleNormalizer;

impl KeyNormalizer for RuleNormalizer {
    fn normalize(&self, entry: &BookmarkEntry, config: &NormalizationConfig) -> Normalized {
        let (mut url, mut title) = if config.decode_html_entities {
            (
                htmlize::unescape(entry.url.as_str()).into_owned(),
                htmlize::unescape(entry.title.as_str()).into_owned(),
            )
        } else {
            (entry.url.clone(), entry.title.clone())
        };

        if config.decode_percent_encoding {
            url = percent_decode_str(&url).decode_utf8_lossy().into_owned();
        }

        if let Some(protocols) = config.filter_protocols.as_ref() {
            if !has_allowed_prefix(&url, protocols.iter().map(String::as_str)) {
                return Normalized::Rejected;
            }
        }

        if config.collapse_protocol {
            url = strip_http_scheme(&url).to_string();
        }

        if config.collapse_trailing_slash {
            url = strip_trailing_slash(&url).to_string();
        }

        title = title.trim().to_string();

        let key = match config.key_mode {
            KeyMode::Url => CanonicalKey::Url(url),
            KeyMode::UrlTitle => CanonicalKey::UrlTitle { url, title },
        };
        Normalized::Accepted(key)
    }

    fn normalize_folder_name(&self, name: &str, config: &NormalizationConfig) -> String {
        if config.decode_html_entities {
            htmlize::unescape(name).trim().to_string()
        } else {
            name.trim().to_string()
        }
    }
}

/// Literal, case-insensitive prefix test (`"http"` also admits `"https"` and `"httpfoo"`).
fn has_allowed_prefix<'p>(url: &str, mut prefixes: impl Iterator<Item = &'p str>) -> bool {
    let lower = url.to_lowercase();
    prefixes.any(|p| lower.starts_with(&p.to_lowercase()))
}

fn strip_prefix_ignore_ascii_case<'u>(url: &'u str, prefix: &str) -> Option<&'u str> {
    let head = url.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &url[prefix.len()..])
}

pub(crate) fn strip_http_scheme(url: &str) -> &str {
    strip_prefix_ignore_ascii_case(url, "https://")
        .or_else(|| strip_prefix_ignore_ascii_case(url, "http://"))
        .unwrap_or(url)
}

/// Removes one trailing `/` when a `/` occurs after the scheme separator.
/// Without a `://` the whole string is treated as the part after the scheme.
pub(crate) fn strip_trailing_slash(url: &str) -> &str {
    let after_scheme = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => url,
    };
    if !after_scheme.contains('/') {
        return url;
    }
    url.strip_suffix('/').unwrap_or(url)
}
