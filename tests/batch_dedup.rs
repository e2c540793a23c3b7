use bookmark_compare::domain::config::{KeyMode, NormalizationConfig};
use bookmark_compare::domain::model::SourceFormat;
use bookmark_compare::infrastructure::html_writer::render_cleaned;
use bookmark_compare::infrastructure::source_file::discover_files;
use bookmark_compare::infrastructure::url_normalizer::RuleNormalizer;
use bookmark_compare::usecase::event::AppEvent;
use bookmark_compare::usecase::run::Pipeline;
use std::path::PathBuf;
use tempfile::tempdir;
use tokio::sync::mpsc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("resources")
        .join(name)
}

#[tokio::test]
async fn discovered_files_are_deduped_under_both_modes() {
    let dir = tempdir().expect("tempdir");
    std::fs::copy(fixture("work.html"), dir.path().join("work.html")).expect("copy work");
    std::fs::copy(fixture("travel.html"), dir.path().join("travel.html")).expect("copy travel");
    std::fs::write(dir.path().join("notes.txt"), "ignored").expect("notes");

    let discovery = discover_files(
        &[dir.path().to_path_buf(), dir.path().join("work.html")],
        "html",
    )
    .await;
    assert_eq!(discovery.files.len(), 2);
    assert_eq!(discovery.repeated.len(), 1);

    let (tx, mut rx) = mpsc::channel::<AppEvent>(256);
    let pipeline = Pipeline {
        config: NormalizationConfig {
            collapse_protocol: true,
            ..NormalizationConfig::default()
        },
        forced_format: None,
        normalizer: &RuleNormalizer,
        sink: Some(tx),
    };
    let (items, stats) = pipeline
        .batch_dedup(&discovery.files, &[KeyMode::Url, KeyMode::UrlTitle])
        .await;
    pipeline.finish(&stats).await;
    drop(pipeline);

    assert_eq!(items.len(), 4);
    assert_eq!(stats.inputs_read, 2);
    assert_eq!(stats.inputs_failed, 0);

    let work_url = items
        .iter()
        .find(|i| i.path.ends_with("work.html") && i.mode == KeyMode::Url)
        .and_then(|i| i.outcome.as_ref().ok())
        .expect("work url-mode outcome");
    // docs.rs twice; the two example.com spellings differ without decoding
    assert_eq!(work_url.report.removed_count, 1);
    assert_eq!(work_url.kept.len(), 5);

    let work_title = items
        .iter()
        .find(|i| i.path.ends_with("work.html") && i.mode == KeyMode::UrlTitle)
        .and_then(|i| i.outcome.as_ref().ok())
        .expect("work url-title outcome");
    // same url, different titles
    assert_eq!(work_title.report.removed_count, 0);

    let cleaned = render_cleaned(&work_url.kept, KeyMode::Url, SourceFormat::Html);
    assert_eq!(cleaned.matches("<DT><A HREF=").count(), 5);
    assert!(cleaned.contains("<TITLE>Bookmarks (Cleaned - url mode)</TITLE>"));
    assert!(cleaned.contains("Example &amp; Co"));

    let mut found = 0;
    let mut last = None;
    while let Some(ev) = rx.recv().await {
        if matches!(ev, AppEvent::DuplicatesFound { .. }) {
            found += 1;
        }
        last = Some(ev);
    }
    assert_eq!(found, 4);
    assert!(matches!(last, Some(AppEvent::Finished { .. })));
}
