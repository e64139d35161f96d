//! Page orchestrator: bounded fan-out of page writers with a completion barrier
//!
//! One blocking task is scheduled per page. A semaphore caps how many of them
//! run at the same time; every page still owns its own file, so workers never
//! contend on a path. `run` only returns once every task has finished.

use crate::error::{Error, PageError, Result};
use crate::page::write_page;
use crate::row::RowGenerator;
use crate::types::{Event, PageReport, PageSpec, RunId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of a successful page phase
#[derive(Clone, Debug)]
pub struct PagesSummary {
    /// Per-page reports ordered by page index
    pub pages: Vec<PageReport>,
    /// Time from first spawn to the barrier
    pub elapsed: Duration,
}

/// Fans page writes out over a bounded pool of blocking workers
pub struct PageOrchestrator<G> {
    generator: Arc<G>,
    max_concurrent_pages: usize,
    event_tx: broadcast::Sender<Event>,
}

impl<G: RowGenerator> PageOrchestrator<G> {
    /// Create an orchestrator that runs at most `max_concurrent_pages` writers at once
    pub fn new(
        generator: Arc<G>,
        max_concurrent_pages: usize,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            generator,
            max_concurrent_pages: max_concurrent_pages.max(1),
            event_tx,
        }
    }

    /// Write `page_count` pages of `row_count` rows each into `directory`
    ///
    /// A failing page does not stop the others. After the barrier, every
    /// failure is reported together in [`Error::PagesFailed`].
    pub async fn run(
        &self,
        run_id: RunId,
        directory: &Path,
        page_count: usize,
        row_count: usize,
    ) -> Result<PagesSummary> {
        let started = Instant::now();
        let pool_size = page_count.min(self.max_concurrent_pages).max(1);
        let permits = Arc::new(Semaphore::new(pool_size));
        let directory: Arc<PathBuf> = Arc::new(directory.to_path_buf());

        info!(
            run_id = %run_id,
            page_count,
            row_count,
            pool_size,
            "writing pages"
        );

        let mut tasks = JoinSet::new();
        for index in 1..=page_count {
            let page = PageSpec::new(index);
            let permits = permits.clone();
            let directory = directory.clone();
            let generator = self.generator.clone();
            let event_tx = self.event_tx.clone();

            tasks.spawn(async move {
                // The semaphore is never closed, so acquire only fails if it is dropped
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return (
                            page.index,
                            Err(PageError::Panicked {
                                page: page.name,
                                reason: e.to_string(),
                            }),
                        );
                    }
                };

                let name = page.name.clone();
                let index = page.index;
                let written = tokio::task::spawn_blocking(move || {
                    write_page(
                        run_id,
                        &directory,
                        &page,
                        row_count,
                        generator.as_ref(),
                        &event_tx,
                    )
                })
                .await;

                let result = match written {
                    Ok(result) => result,
                    Err(e) => Err(PageError::Panicked {
                        page: name,
                        reason: e.to_string(),
                    }),
                };
                (index, result)
            });
        }

        let mut reports = Vec::with_capacity(page_count);
        let mut failures = Vec::new();

        // Barrier: drain every task before deciding the outcome
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(report))) => reports.push((index, report)),
                Ok((index, Err(e))) => {
                    warn!(run_id = %run_id, page = e.page(), error = %e, "page failed");
                    failures.push((index, e));
                }
                Err(e) => {
                    // The async wrapper itself never panics; treat it like a worker panic
                    warn!(run_id = %run_id, error = %e, "page task did not complete");
                    failures.push((
                        usize::MAX,
                        PageError::Panicked {
                            page: "unknown".to_string(),
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }

        let elapsed = started.elapsed();

        if !failures.is_empty() {
            failures.sort_by_key(|(index, _)| *index);
            return Err(Error::PagesFailed {
                total: page_count,
                failures: failures.into_iter().map(|(_, e)| e).collect(),
            });
        }

        reports.sort_by_key(|(index, _)| *index);
        debug!(
            run_id = %run_id,
            pages = reports.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "all pages written"
        );

        Ok(PagesSummary {
            pages: reports.into_iter().map(|(_, report)| report).collect(),
            elapsed,
        })
    }
}
