//! Netscape bookmark-file writers: flat cleaned output and nested JSON-tree conversion.

use crate::domain::config::KeyMode;
use crate::domain::model::{BookmarkEntry, SourceFormat};
use crate::infrastructure::serde_json_adapter::{BookmarkNodeDto, BookmarksFileDto};
use std::borrow::Cow;
use std::fmt::Write as _;

const DOCTYPE: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n";
const META: &str = "<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n";
const INDENT: &str = "    ";

fn header(out: &mut String, title: &str) {
    out.push_str(DOCTYPE);
    out.push_str(META);
    let _ = writeln!(out, "<TITLE>{title}</TITLE>");
    let _ = writeln!(out, "<H1>{title}</H1>");
    out.push_str("<DL><p>\n");
}

/// Raw values from HTML input are still entity-encoded; decode first so they are not escaped twice.
fn plain<'a>(raw: &'a str, format: SourceFormat) -> Cow<'a, str> {
    match format {
        SourceFormat::Html => htmlize::unescape(raw),
        SourceFormat::JsonTree => Cow::Borrowed(raw),
    }
}

/// Flat bookmark file holding the entries kept by deduplication, in order.
pub fn render_cleaned(entries: &[BookmarkEntry], mode: KeyMode, format: SourceFormat) -> String {
    let mut out = String::new();
    header(&mut out, &format!("Bookmarks (Cleaned - {mode} mode)"));
    for e in entries {
        let url = plain(&e.url, format);
        let title = plain(&e.title, format);
        let _ = writeln!(
            out,
            "{INDENT}<DT><A HREF=\"{}\">{}</A>",
            htmlize::escape_attribute(url.as_ref()),
            htmlize::escape_text(title.as_ref())
        );
    }
    out.push_str("</DL><p>\n");
    out
}

enum Step<'a> {
    Enter(&'a BookmarkNodeDto, usize),
    Leave(usize),
}

/// Nested bookmark file mirroring a JSON tree. Roots are emitted in key order.
pub fn render_tree(dto: &BookmarksFileDto) -> String {
    let mut out = String::new();
    header(&mut out, "Bookmarks");

    let mut stack: Vec<Step<'_>> = dto
        .roots
        .values()
        .rev()
        .map(|root| Step::Enter(root, 1))
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Leave(depth) => {
                let _ = writeln!(out, "{}</DL><p>", INDENT.repeat(depth));
            }
            Step::Enter(node, depth) => {
                let indent = INDENT.repeat(depth);
                let name = htmlize::escape_attribute(node.name.as_deref().unwrap_or_default());
                match node.node_type.as_str() {
                    "folder" => {
                        let _ = writeln!(
                            out,
                            "{indent}<DT><H3 ADD_DATE=\"{}\">{name}</H3>",
                            node.add_date()
                        );
                        let _ = writeln!(out, "{indent}<DL><p>");
                        stack.push(Step::Leave(depth));
                        for child in node.children.iter().rev() {
                            stack.push(Step::Enter(child, depth + 1));
                        }
                    }
                    "url" => {
                        let url = htmlize::escape_attribute(node.url.as_deref().unwrap_or_default());
                        let _ = writeln!(
                            out,
                            "{indent}<DT><A HREF=\"{url}\" ADD_DATE=\"{}\">{name}</A>",
                            node.add_date()
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    out.push_str("</DL><p>\n");
    out
}
