//! Pull-based markup scanner.
//!
//! Produces `StartTag`, `EndTag` and `Text` events in one left-to-right pass with no
//! backtracking. Tag and attribute names are ASCII-lowercased; attribute values may be
//! double-quoted, single-quoted or bare. Comments, doctypes and `<!`/`<?` declarations
//! are skipped. A `<` that does not open a tag is returned as text.
//!
//! Entity references are left untouched; decoding is a normalization rule.

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent<'a> {
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
    },
    EndTag {
        name: String,
    },
    Text(&'a str),
}

impl TagEvent<'_> {
    /// Value of the first attribute called `name` (lowercase), if this is a start tag.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            TagEvent::StartTag { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

pub struct TagStream<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TagStream<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_past(&mut self, needle: &str, from: usize) {
        match self.input[from..].find(needle) {
            Some(off) => self.pos = from + off + needle.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn scan_name(&self, start: usize) -> usize {
        let bytes = self.input.as_bytes();
        let mut j = start;
        while j < bytes.len() && is_name_char(bytes[j]) {
            j += 1;
        }
        j
    }

    fn end_tag(&mut self) -> TagEvent<'a> {
        let start = self.pos + 2;
        let end = self.scan_name(start);
        let name = self.input[start..end].to_ascii_lowercase();
        self.skip_past(">", end);
        TagEvent::EndTag { name }
    }

    fn start_tag(&mut self) -> TagEvent<'a> {
        let bytes = self.input.as_bytes();
        let len = bytes.len();
        let start = self.pos + 1;
        let mut k = self.scan_name(start);
        let name = self.input[start..k].to_ascii_lowercase();
        let mut attrs = Vec::new();

        let skip_ws = |k: &mut usize| {
            while *k < len && bytes[*k].is_ascii_whitespace() {
                *k += 1;
            }
        };

        loop {
            skip_ws(&mut k);
            if k >= len {
                break;
            }
            if bytes[k] == b'>' {
                k += 1;
                break;
            }
            let attr_start = k;
            while k < len && is_name_char(bytes[k]) {
                k += 1;
            }
            if attr_start == k {
                // stray byte such as `/` or a lone quote
                k += 1;
                continue;
            }
            let attr_name = self.input[attr_start..k].to_ascii_lowercase();

            skip_ws(&mut k);
            let mut value = String::new();
            if k < len && bytes[k] == b'=' {
                k += 1;
                skip_ws(&mut k);
                if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                    let quote = bytes[k];
                    k += 1;
                    let vstart = k;
                    while k < len && bytes[k] != quote {
                        k += 1;
                    }
                    value.push_str(&self.input[vstart..k]);
                    if k < len {
                        k += 1;
                    }
                } else {
                    let vstart = k;
                    while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                        k += 1;
                    }
                    value.push_str(&self.input[vstart..k]);
                }
            }
            attrs.push((attr_name, value));
        }

        self.pos = k;
        TagEvent::StartTag { name, attrs }
    }
}

impl<'a> Iterator for TagStream<'a> {
    type Item = TagEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.input.as_bytes();
        // Slice endpoints are only ever cut at ASCII bytes, so they stay on char boundaries.
        loop {
            if self.pos >= bytes.len() {
                return None;
            }
            let i = self.pos;

            if bytes[i] != b'<' {
                let end = self.input[i..]
                    .find('<')
                    .map(|off| i + off)
                    .unwrap_or(bytes.len());
                self.pos = end;
                return Some(TagEvent::Text(&self.input[i..end]));
            }

            if self.input[i..].starts_with(COMMENT_START) {
                self.skip_past(COMMENT_END, i + COMMENT_START.len());
                continue;
            }

            let next = bytes.get(i + 1).copied();
            match next {
                Some(b'!') | Some(b'?') => {
                    self.skip_past(">", i + 2);
                    continue;
                }
                Some(b'/') if bytes.get(i + 2).is_some_and(|c| c.is_ascii_alphabetic()) => {
                    return Some(self.end_tag());
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    return Some(self.start_tag());
                }
                _ => {
                    self.pos = i + 1;
                    return Some(TagEvent::Text(&self.input[i..i + 1]));
                }
            }
        }
    }
}

/// Keeps only the text events of `text`, dropping whatever the scanner reads as markup.
///
/// A `<` that does not open a tag survives, so `1 < 2 > 0` is unchanged.
pub fn strip_markup(text: &str) -> String {
    TagStream::new(text)
        .filter_map(|ev| match ev {
            TagEvent::Text(t) => Some(t),
            _ => None,
        })
        .collect()
}
