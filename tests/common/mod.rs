//! Common test utilities for page-forge integration tests

use page_forge::{Config, Event, Pipeline};
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;

/// Config with both folder roots inside `root`
pub fn config_in(root: &Path, page_count: usize, row_count: usize) -> Config {
    let mut config = Config::default();
    config.pipeline.page_count = page_count;
    config.pipeline.row_count = row_count;
    config.folders.pages_folder = root.join("pages");
    config.folders.builds_folder = root.join("builds");
    config
}

/// Collect events from `events` until `stop_predicate` matches or `timeout` elapses
///
/// The matching event is included in the result.
pub async fn collect_events_until<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    stop_predicate: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut collected = Vec::new();

    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            let should_stop = stop_predicate(&event);
            collected.push(event);
            if should_stop {
                break;
            }
        }
    })
    .await;

    collected
}

/// Subscribe, run once, and return the run's events alongside its result
#[allow(dead_code)]
pub async fn run_collecting(
    pipeline: &Pipeline,
) -> (page_forge::Result<page_forge::RunSummary>, Vec<Event>) {
    let mut events = pipeline.subscribe();
    let result = pipeline.run_new().await;
    let collected =
        collect_events_until(&mut events, Duration::from_secs(5), Event::is_terminal).await;
    (result, collected)
}
