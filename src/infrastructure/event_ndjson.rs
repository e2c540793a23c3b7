use crate::usecase::event::AppEvent;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn app_event_to_json(ev: &AppEvent) -> serde_json::Value {
    match ev {
        AppEvent::PhaseStarted { name } => json!({"type":"phase_started","name":name}),
        AppEvent::PhaseFinished { name } => json!({"type":"phase_finished","name":name}),
        AppEvent::InputParsed {
            source,
            format,
            bookmarks,
            unique_bookmarks,
            folders,
            unique_folders,
            filtered,
            malformed,
        } => {
            json!({"type":"input_parsed","source":source,"format":format,"bookmarks":bookmarks,"unique_bookmarks":unique_bookmarks,"folders":folders,"unique_folders":unique_folders,"filtered":filtered,"malformed":malformed})
        }
        AppEvent::InputFailed { source, reason } => {
            json!({"type":"input_failed","source":source,"reason":reason})
        }
        AppEvent::ComparisonComputed {
            operation,
            inputs,
            bookmarks,
            folders,
        } => {
            json!({"type":"comparison_computed","operation":operation,"inputs":inputs,"bookmarks":bookmarks,"folders":folders})
        }
        AppEvent::DuplicatesFound {
            source,
            groups,
            removed,
        } => {
            json!({"type":"duplicates_found","source":source,"groups":groups,"removed":removed})
        }
        AppEvent::FileWritten { path } => json!({"type":"file_written","path":path}),
        AppEvent::Finished { stats } => json!({"type":"finished","stats":stats}),
    }
}

pub fn spawn_ndjson_printer(mut rx: mpsc::Receiver<AppEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let line = app_event_to_json(&ev);

            // NDJSON to stdout.
            println!("{line}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SourceFormat;
    use crate::usecase::stats::RunStats;

    #[test]
    fn app_event_to_json_covers_all_variants() {
        let v = app_event_to_json(&AppEvent::PhaseStarted {
            name: "x".to_string(),
        });
        assert_eq!(v["type"], "phase_started");

        let v = app_event_to_json(&AppEvent::PhaseFinished {
            name: "x".to_string(),
        });
        assert_eq!(v["type"], "phase_finished");

        let v = app_event_to_json(&AppEvent::InputParsed {
            source: "a.json".to_string(),
            format: SourceFormat::JsonTree,
            bookmarks: 3,
            unique_bookmarks: 2,
            folders: 1,
            unique_folders: 1,
            filtered: 0,
            malformed: 0,
        });
        assert_eq!(v["type"], "input_parsed");
        assert_eq!(v["format"], "json-tree");
        assert_eq!(v["unique_bookmarks"], 2);

        let v = app_event_to_json(&AppEvent::InputFailed {
            source: "missing.html".to_string(),
            reason: "not found".to_string(),
        });
        assert_eq!(v["type"], "input_failed");

        let v = app_event_to_json(&AppEvent::ComparisonComputed {
            operation: "intersection".to_string(),
            inputs: 3,
            bookmarks: 1,
            folders: 0,
        });
        assert_eq!(v["type"], "comparison_computed");
        assert_eq!(v["inputs"], 3);

        let v = app_event_to_json(&AppEvent::DuplicatesFound {
            source: "a.html".to_string(),
            groups: 1,
            removed: 2,
        });
        assert_eq!(v["type"], "duplicates_found");

        let v = app_event_to_json(&AppEvent::FileWritten {
            path: "/tmp/r.txt".to_string(),
        });
        assert_eq!(v["type"], "file_written");

        let v = app_event_to_json(&AppEvent::Finished {
            stats: RunStats::default(),
        });
        assert_eq!(v["type"], "finished");
        assert_eq!(v["stats"]["inputs_read"], 0);
    }

    #[tokio::test]
    async fn spawn_ndjson_printer_drains_and_exits() {
        let (tx, rx) = mpsc::channel::<AppEvent>(8);
        let handle = spawn_ndjson_printer(rx);

        tx.send(AppEvent::PhaseStarted {
            name: "x".to_string(),
        })
        .await
        .expect("send");
        drop(tx);

        handle.await.expect("join");
    }
}
