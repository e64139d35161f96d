//! End-to-end runs through the public API
//!
//! These tests drive [`Pipeline`] the way the HTTP layer does and check the
//! files it leaves on disk.

mod common;

use common::{collect_events_until, config_in, run_collecting};
use page_forge::{Event, PageSpec, Phase, Pipeline, RowGenerator};
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;
use walkdir::WalkDir;

fn line_count(path: &Path) -> usize {
    let file = std::fs::File::open(path).unwrap();
    BufReader::new(file).lines().count()
}

fn files_under(root: &Path) -> Vec<std::path::PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

#[tokio::test]
async fn test_full_run_keeps_consistent_artifacts() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config_in(temp_dir.path(), 8, 500);
    config.pipeline.keep_artifacts = true;
    let pipeline = Pipeline::new(config).unwrap();

    let (result, events) = run_collecting(&pipeline).await;
    let summary = result.unwrap();

    let run_dir = summary.run_id.to_string();
    let pages_dir = temp_dir.path().join("pages").join(&run_dir);
    let builds_dir = temp_dir.path().join("builds").join(&run_dir);

    // Every page holds exactly row_count rows
    let pages = files_under(&pages_dir);
    assert_eq!(pages.len(), 8);
    let total: usize = pages.iter().map(|page| line_count(page)).sum();
    assert_eq!(total, 4000);
    for page in &pages {
        assert_eq!(line_count(page), 500, "{}", page.display());
    }

    // Both exports hold every row and are byte-identical
    let write_export = std::fs::read(builds_dir.join("export_write")).unwrap();
    let copy_export = std::fs::read(builds_dir.join("export_copy")).unwrap();
    assert_eq!(write_export, copy_export);
    assert_eq!(line_count(&builds_dir.join("export_write")), 4000);
    assert_eq!(files_under(&builds_dir).len(), 2);

    // Every row is a JSON object
    let first_line = write_export.split(|b| *b == b'\n').next().unwrap();
    let row: serde_json::Value = serde_json::from_slice(first_line).unwrap();
    assert!(row["id"].is_string());

    assert!(!summary.cleaned_up);
    assert_eq!(
        summary.timings.iter().map(|t| t.phase).collect::<Vec<_>>(),
        vec![Phase::CreatingPages, Phase::WritingExport, Phase::CopyingExport]
    );

    let page_events = events
        .iter()
        .filter(|e| matches!(e, Event::PageComplete { .. }))
        .count();
    assert_eq!(page_events, 8);
    assert!(!events.iter().any(|e| matches!(e, Event::CleanedUp { .. })));
}

#[tokio::test]
async fn test_run_cleans_up_and_can_repeat() {
    let temp_dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(temp_dir.path(), 4, 25)).unwrap();

    for _ in 0..2 {
        let summary = pipeline.run_new().await.unwrap();
        assert!(summary.cleaned_up);
        assert_eq!(summary.write_export.lines, Some(100));
    }

    assert!(files_under(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_zero_rows_gives_empty_pages_and_exports() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config_in(temp_dir.path(), 3, 0);
    config.pipeline.keep_artifacts = true;
    let pipeline = Pipeline::new(config).unwrap();

    let summary = pipeline.run_new().await.unwrap();

    assert_eq!(summary.pages.len(), 3);
    assert!(summary.pages.iter().all(|p| p.bytes_written == 0));
    assert_eq!(summary.write_export.bytes_written, 0);
    assert_eq!(summary.copy_export.bytes_written, 0);
    assert_eq!(summary.write_export.files_merged, 3);
}

/// Row type whose serialization always fails
struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("row cannot be encoded"))
    }
}

/// Generator that poisons the last page
struct LastPagePoisoned {
    last: usize,
}

impl RowGenerator for LastPagePoisoned {
    type Row = Option<Unserializable>;

    fn generate(&self, page: &PageSpec) -> Self::Row {
        (page.index == self.last).then_some(Unserializable)
    }
}

#[tokio::test]
async fn test_failed_page_fails_run_but_cleans_up() {
    let temp_dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::with_generator(
        config_in(temp_dir.path(), 4, 10),
        LastPagePoisoned { last: 4 },
    )
    .unwrap();

    let mut events = pipeline.subscribe();
    let error = pipeline.run_new().await.unwrap_err();

    assert!(matches!(error, page_forge::Error::PagesFailed { total: 4, .. }));
    assert!(error.to_string().contains("page_4"), "{error}");

    let events = collect_events_until(&mut events, Duration::from_secs(5), Event::is_terminal).await;
    assert!(matches!(events.last(), Some(Event::RunFailed { .. })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, Event::PageComplete { .. }))
            .count(),
        3
    );

    assert!(files_under(temp_dir.path()).is_empty());
}
