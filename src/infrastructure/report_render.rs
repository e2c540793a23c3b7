//! Text and JSON renderers for [`Report`] values.

use crate::domain::config::NormalizationConfig;
use crate::domain::model::{BookmarkEntry, CanonicalKey};
use crate::usecase::report::{CompareReport, DedupReport, DiffReport, Report, SourceSummary};
use anyhow::Result;
use std::fmt::Write as _;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }

    pub fn render(&self, report: &Report) -> Result<String> {
        match self {
            OutputFormat::Text => Ok(render_text(report)),
            OutputFormat::Json => {
                let mut s = serde_json::to_string_pretty(report)?;
                s.push('\n');
                Ok(s)
            }
        }
    }
}

fn on_off(b: bool) -> &'static str {
    if b {
        "on"
    } else {
        "off"
    }
}

fn options_lines(out: &mut String, cfg: &NormalizationConfig) {
    let filter = match cfg.filter_protocols.as_ref() {
        Some(p) => p.iter().cloned().collect::<Vec<_>>().join(","),
        None => "off".to_string(),
    };
    let _ = writeln!(out, "Key mode: {}", cfg.key_mode);
    let _ = writeln!(out, "HTML entity decoding: {}", on_off(cfg.decode_html_entities));
    let _ = writeln!(out, "Percent decoding: {}", on_off(cfg.decode_percent_encoding));
    let _ = writeln!(out, "Protocol filter: {filter}");
    let _ = writeln!(out, "Collapse http/https: {}", on_off(cfg.collapse_protocol));
    let _ = writeln!(out, "Ignore trailing slash: {}", on_off(cfg.collapse_trailing_slash));
}

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
}

fn rule(out: &mut String) {
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

fn summary(out: &mut String, label: &str, s: &SourceSummary) {
    let _ = writeln!(out, "{label}: {} ({})", s.source, s.format);
    let _ = writeln!(
        out,
        "  - bookmarks: {} (unique: {})",
        s.total_bookmarks, s.unique_bookmarks
    );
    let _ = writeln!(out, "  - folders: {} (unique: {})", s.total_folders, s.unique_folders);
    if s.filtered > 0 || s.malformed > 0 {
        let _ = writeln!(out, "  - filtered: {}, malformed: {}", s.filtered, s.malformed);
    }
}

fn list<T: std::fmt::Display>(out: &mut String, indent: &str, heading: &str, items: &[T]) {
    let _ = writeln!(out, "{indent}--- {heading} ({}) ---", items.len());
    if items.is_empty() {
        let _ = writeln!(out, "{indent}  (none)");
    }
    for item in items {
        let _ = writeln!(out, "{indent}  - {item}");
    }
    out.push('\n');
}

fn entry_lines(out: &mut String, e: &BookmarkEntry) {
    let _ = writeln!(out, "  - title: {}", e.title);
    let _ = writeln!(out, "    url:   {}", e.url);
}

fn render_diff(out: &mut String, r: &DiffReport) {
    banner(out, "Bookmark comparison report");
    options_lines(out, &r.config);
    rule(out);
    summary(out, "File A", &r.a);
    summary(out, "File B", &r.b);
    rule(out);
    out.push('\n');

    let (a, b) = (&r.a.source, &r.b.source);
    list::<CanonicalKey>(out, "", &format!("Bookmarks only in {a}"), &r.bookmarks.only_a);
    list::<CanonicalKey>(out, "", &format!("Bookmarks only in {b}"), &r.bookmarks.only_b);
    list::<String>(out, "", &format!("Folders only in {a}"), &r.folders.only_a);
    list::<String>(out, "", &format!("Folders only in {b}"), &r.folders.only_b);
}

fn render_compare(out: &mut String, r: &CompareReport) {
    banner(out, "Multi-file bookmark analysis");
    options_lines(out, &r.config);
    let _ = writeln!(out, "Analysis: {}", r.analysis.as_str());
    rule(out);
    for s in &r.sources {
        summary(out, "File", s);
    }
    rule(out);
    out.push('\n');

    if let Some(i) = r.intersection.as_ref() {
        let _ = writeln!(out, "[Intersection]\n");
        list(
            out,
            "",
            &format!("Bookmarks common to all {} files", i.inputs),
            &i.common_bookmarks,
        );
        list(
            out,
            "",
            &format!("Folders common to all {} files", i.inputs),
            &i.common_folders,
        );
    }

    if let Some(u) = r.unique.as_ref() {
        let _ = writeln!(out, "[Unique items]\n");
        for set in &u.per_source {
            let _ = writeln!(out, "=== {} ===", set.source);
            list(out, "  ", "Unique bookmarks", &set.unique_bookmarks);
            list(out, "  ", "Unique folders", &set.unique_folders);
        }
    }
}

fn render_dedup(out: &mut String, r: &DedupReport) {
    banner(out, "Bookmark deduplication report");
    let _ = writeln!(out, "Source: {} ({})", r.source.source, r.source.format);
    options_lines(out, &r.config);
    rule(out);
    let _ = writeln!(out, "Bookmarks read: {}", r.total_bookmark_count);
    let _ = writeln!(out, "Bookmarks remaining: {}", r.remaining_count);
    if r.filtered_count > 0 {
        let _ = writeln!(out, "Filtered out: {}", r.filtered_count);
    }
    let _ = writeln!(
        out,
        "Result: {} duplicate groups, {} duplicates removed",
        r.groups.len(),
        r.removed_count
    );
    rule(out);
    out.push('\n');

    if r.groups.is_empty() {
        let _ = writeln!(out, "No duplicates found.");
        return;
    }

    let n = r.groups.len();
    for (i, g) in r.groups.iter().enumerate() {
        let _ = writeln!(
            out,
            "--- Group {}/{n} ({} entries) key: {} ---",
            i + 1,
            g.removed.len() + 1,
            g.key
        );
        let _ = writeln!(out, "[kept] first occurrence");
        entry_lines(out, &g.kept);
        let _ = writeln!(out, "[removed] {}", g.removed.len());
        for e in &g.removed {
            entry_lines(out, e);
        }
        out.push('\n');
    }
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    match report {
        Report::Diff(r) => render_diff(&mut out, r),
        Report::Compare(r) => render_compare(&mut out, r),
        Report::Dedup(r) => render_dedup(&mut out, r),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::KeyMode;
    use crate::domain::model::{Collection, ParsedEntity, SourceFormat};
    use crate::infrastructure::url_normalizer::RuleNormalizer;
    use crate::usecase::collection::{build_collection, collection_from_text};
    use crate::usecase::compare::{diff, intersect, unique_complement};
    use crate::usecase::dedup::dedup;
    use crate::usecase::report::Analysis;

    fn coll(source: &str, entries: &[(&str, &str)], mode: KeyMode) -> Collection {
        build_collection(
            source,
            SourceFormat::Html,
            entries
                .iter()
                .map(|(u, t)| ParsedEntity::Bookmark(BookmarkEntry::new(*u, *t))),
            &NormalizationConfig::default().with_key_mode(mode),
            &RuleNormalizer,
        )
    }

    #[test]
    fn diff_text_lists_sections_with_none_marker() {
        let a = coll("a.html", &[("http://x", "X"), ("http://y", "Y")], KeyMode::UrlTitle);
        let b = coll("b.html", &[("http://y", "Y")], KeyMode::UrlTitle);
        let r = DiffReport::new(&a, &b, diff(&a, &b).expect("diff"));
        let text = render_text(&Report::Diff(r));
        assert!(text.contains("--- Bookmarks only in a.html (1) ---\n  - [ X ] http://x\n"));
        assert!(text.contains("--- Bookmarks only in b.html (0) ---\n  (none)\n"));
        assert!(text.contains("Key mode: url-title"));
    }

    #[test]
    fn compare_text_renders_both_sections_for_all() {
        let cs = vec![
            coll("a", &[("http://common", ""), ("http://a", "")], KeyMode::Url),
            coll("b", &[("http://common", "")], KeyMode::Url),
        ];
        let r = CompareReport::new(
            &cs,
            Analysis::All,
            Some(intersect(&cs).expect("i")),
            Some(unique_complement(&cs).expect("u")),
        );
        let text = render_text(&Report::Compare(r));
        assert!(text.contains("Bookmarks common to all 2 files (1) ---\n  - http://common\n"));
        assert!(text.contains("=== a ===\n  --- Unique bookmarks (1) ---\n    - http://a\n"));
        assert!(text.contains("=== b ===\n  --- Unique bookmarks (0) ---\n    (none)\n"));
    }

    #[test]
    fn dedup_text_shows_kept_then_removed() {
        let c = collection_from_text(
            "d.html",
            r#"<a href="http://x">one</a><a href="http://x">two</a>"#,
            SourceFormat::Html,
            &NormalizationConfig::default(),
            &RuleNormalizer,
            true,
        )
        .expect("build");
        let res = dedup(&c).expect("dedup");
        let text = render_text(&Report::Dedup(DedupReport::new(&c, &res)));
        let kept_at = text.find("title: one").expect("kept");
        let removed_at = text.find("title: two").expect("removed");
        assert!(kept_at < removed_at);
        assert!(text.contains("Result: 1 duplicate groups, 1 duplicates removed"));
    }

    #[test]
    fn identical_inputs_render_identically() {
        let a = coll("a", &[("http://x", "")], KeyMode::Url);
        let b = coll("b", &[("http://y", "")], KeyMode::Url);
        let r1 = Report::Diff(DiffReport::new(&a, &b, diff(&a, &b).expect("diff")));
        let r2 = Report::Diff(DiffReport::new(&a, &b, diff(&a, &b).expect("diff")));
        assert_eq!(render_text(&r1), render_text(&r2));
        assert_eq!(
            OutputFormat::Json.render(&r1).expect("json"),
            OutputFormat::Json.render(&r2).expect("json")
        );
    }

    #[test]
    fn json_output_is_tagged() {
        let a = coll("a", &[], KeyMode::Url);
        let r = Report::Diff(DiffReport::new(&a, &a, diff(&a, &a).expect("diff")));
        let v: serde_json::Value =
            serde_json::from_str(&OutputFormat::Json.render(&r).expect("json")).expect("parse");
        assert_eq!(v["report"], "diff");
        assert_eq!(v["bookmarks"]["only_a"], serde_json::json!([]));
    }
}
