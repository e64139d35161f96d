//! One end-to-end run: prepare folders, write pages, merge twice, clean up
//!
//! ```text
//! RunStarted
//!   -> remake pages/<run_id>, builds/<run_id>
//!   -> pages (bounded fan-out, barrier)      PhaseComplete(creating_pages)
//!   -> RewriteMerge -> builds/.../export_write  PhaseComplete(writing_export)
//!   -> CopyMerge    -> builds/.../export_copy   PhaseComplete(copying_export)
//!   -> cleanup                               CleanedUp
//! RunComplete | RunFailed
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filesystem::{RunFolders, cleanup, remake_folder};
use crate::merge::{CopyMerge, MergeStrategy, RewriteMerge};
use crate::orchestrator::PageOrchestrator;
use crate::row::{RowGenerator, UuidRowGenerator};
use crate::types::{Event, MergeReport, Phase, PhaseTiming, RunId, RunSummary};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Runs the page generation and merge pipeline
///
/// Cheap to clone; all clones share the event channel. Runs started from
/// different clones (or concurrently from the same one) are isolated by
/// their [`RunId`].
pub struct Pipeline<G = UuidRowGenerator> {
    config: Arc<Config>,
    orchestrator: Arc<PageOrchestrator<G>>,
    event_tx: broadcast::Sender<Event>,
}

impl<G> Clone for Pipeline<G> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            orchestrator: self.orchestrator.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl Pipeline<UuidRowGenerator> {
    /// Create a pipeline producing random UUID rows
    pub fn new(config: Config) -> Result<Self> {
        Self::with_generator(config, UuidRowGenerator)
    }
}

impl<G: RowGenerator> Pipeline<G> {
    /// Create a pipeline with a custom row generator
    pub fn with_generator(config: Config, generator: G) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let orchestrator = PageOrchestrator::new(
            Arc::new(generator),
            config.pipeline.max_concurrent_pages,
            event_tx.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            event_tx,
        })
    }

    /// Configuration this pipeline runs with
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Subscribe to events from every run of this pipeline
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Send an event to all subscribers; having none is not an error
    pub fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Run once under a freshly generated id
    pub async fn run_new(&self) -> Result<RunSummary> {
        self.run(RunId::new()).await
    }

    /// Run once under `run_id`
    ///
    /// Subscribe before calling this to see every event of the run. Run
    /// folders are removed at the end whether or not the run succeeded,
    /// unless `keep_artifacts` is set.
    pub async fn run(&self, run_id: RunId) -> Result<RunSummary> {
        let folders = RunFolders::for_run(&self.config, run_id);
        let page_count = self.config.pipeline.page_count;
        let row_count = self.config.pipeline.row_count;

        info!(run_id = %run_id, page_count, row_count, "run started");
        self.emit_event(Event::RunStarted {
            run_id,
            page_count,
            row_count,
        });

        let result = self.execute(run_id, &folders).await;

        let result = match result {
            Ok(mut summary) => {
                if self.config.pipeline.keep_artifacts {
                    Ok(summary)
                } else {
                    match cleanup(&folders.paths()).await {
                        Ok(()) => {
                            summary.cleaned_up = true;
                            self.emit_event(Event::CleanedUp { run_id });
                            Ok(summary)
                        }
                        Err(e) => Err(Error::from(e)),
                    }
                }
            }
            Err(e) => {
                if !self.config.pipeline.keep_artifacts {
                    if let Err(cleanup_error) = cleanup(&folders.paths()).await {
                        warn!(
                            run_id = %run_id,
                            error = %cleanup_error,
                            "cleanup after failed run did not complete"
                        );
                    }
                }
                Err(e)
            }
        };

        match &result {
            Ok(summary) => {
                info!(run_id = %run_id, pages = summary.pages.len(), "run complete");
                self.emit_event(Event::RunComplete {
                    run_id,
                    summary: Box::new(summary.clone()),
                });
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "run failed");
                self.emit_event(Event::RunFailed {
                    run_id,
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn execute(&self, run_id: RunId, folders: &RunFolders) -> Result<RunSummary> {
        let page_count = self.config.pipeline.page_count;
        let row_count = self.config.pipeline.row_count;

        remake_folder(&folders.pages).await?;
        remake_folder(&folders.builds).await?;

        let mut timings = Vec::with_capacity(3);

        let pages = self
            .orchestrator
            .run(run_id, &folders.pages, page_count, row_count)
            .await?;
        timings.push(self.phase_complete(run_id, Phase::CreatingPages, pages.elapsed));

        let write_export = self
            .merge_phase(run_id, Phase::WritingExport, &RewriteMerge, folders, &mut timings)
            .await?;
        let copy_export = self
            .merge_phase(run_id, Phase::CopyingExport, &CopyMerge, folders, &mut timings)
            .await?;

        Ok(RunSummary {
            run_id,
            page_count,
            row_count,
            pages: pages.pages,
            write_export,
            copy_export,
            timings,
            cleaned_up: false,
        })
    }

    async fn merge_phase(
        &self,
        run_id: RunId,
        phase: Phase,
        strategy: &dyn MergeStrategy,
        folders: &RunFolders,
        timings: &mut Vec<PhaseTiming>,
    ) -> Result<MergeReport> {
        let started = Instant::now();
        let destination = folders.builds.join(strategy.name());
        let report = strategy.merge(&folders.pages, &destination).await?;
        timings.push(self.phase_complete(run_id, phase, started.elapsed()));
        Ok(report)
    }

    fn phase_complete(
        &self,
        run_id: RunId,
        phase: Phase,
        elapsed: std::time::Duration,
    ) -> PhaseTiming {
        let elapsed_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        info!(run_id = %run_id, phase = phase.label(), ?elapsed, "phase complete");
        self.emit_event(Event::PhaseComplete {
            run_id,
            phase,
            elapsed_ns,
        });
        PhaseTiming { phase, elapsed_ns }
    }
}
