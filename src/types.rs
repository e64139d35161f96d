//! Core types and events for page-forge

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a run
///
/// A run's working folders are isolated under this id, so concurrent runs
/// never touch each other's files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a fresh random RunId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A page to be written: its 1-based index and file name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSpec {
    /// 1-based page index
    pub index: usize,
    /// File name inside the pages folder (e.g. "page_3")
    pub name: String,
}

impl PageSpec {
    /// Describe page `index` using the `page_<index>` naming scheme
    pub fn new(index: usize) -> Self {
        Self {
            index,
            name: format!("page_{index}"),
        }
    }
}

/// Timed phases of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Concurrent page generation, up to the barrier
    CreatingPages,
    /// Line-by-line rewrite merge ("export_write")
    WritingExport,
    /// Raw byte copy merge ("export_copy")
    CopyingExport,
}

impl Phase {
    /// Human-readable label used in progress text
    pub fn label(&self) -> &'static str {
        match self {
            Phase::CreatingPages => "Creating pages",
            Phase::WritingExport => "Writing to export",
            Phase::CopyingExport => "Copying to export",
        }
    }
}

/// Result of writing one page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageReport {
    /// Page file name
    pub name: String,
    /// Number of rows written
    pub rows: usize,
    /// Bytes written, newline delimiters included
    pub bytes_written: u64,
}

/// Result of one merge strategy invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MergeReport {
    /// Strategy name ("export_write" or "export_copy")
    pub strategy: String,
    /// Destination file
    #[schema(value_type = String)]
    pub destination: PathBuf,
    /// Number of page files consumed
    pub files_merged: usize,
    /// Lines rewritten (only known to the rewrite strategy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<u64>,
    /// Bytes appended to the destination
    pub bytes_written: u64,
}

/// Elapsed time of one phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhaseTiming {
    /// Phase that was timed
    pub phase: Phase,
    /// Wall-clock duration in nanoseconds
    pub elapsed_ns: u64,
}

/// Summary of a successful run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: RunId,
    /// Pages requested
    pub page_count: usize,
    /// Rows per page requested
    pub row_count: usize,
    /// Per-page results, ordered by page index
    pub pages: Vec<PageReport>,
    /// Rewrite merge result
    pub write_export: MergeReport,
    /// Copy merge result
    pub copy_export: MergeReport,
    /// Phase timings in execution order
    pub timings: Vec<PhaseTiming>,
    /// Whether the run folders were removed at the end
    pub cleaned_up: bool,
}

/// Event emitted during a run
///
/// Consumers subscribe via [`Pipeline::subscribe`](crate::Pipeline::subscribe);
/// every event carries the id of the run it belongs to.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Run accepted, folders about to be prepared
    RunStarted {
        /// Run ID
        run_id: RunId,
        /// Pages to write
        page_count: usize,
        /// Rows per page
        row_count: usize,
    },

    /// A page file was fully written and closed
    PageComplete {
        /// Run ID
        run_id: RunId,
        /// Page file name
        page: String,
        /// Rows written
        rows: usize,
        /// Bytes written
        bytes: u64,
    },

    /// A timed phase finished
    PhaseComplete {
        /// Run ID
        run_id: RunId,
        /// Phase that finished
        phase: Phase,
        /// Duration in milliseconds
        elapsed_ns: u64,
    },

    /// Run folders removed
    CleanedUp {
        /// Run ID
        run_id: RunId,
    },

    /// Run finished successfully
    RunComplete {
        /// Run ID
        run_id: RunId,
        /// Full run summary
        summary: Box<RunSummary>,
    },

    /// Run failed
    RunFailed {
        /// Run ID
        run_id: RunId,
        /// Error message
        error: String,
    },
}

impl Event {
    /// The run this event belongs to
    pub fn run_id(&self) -> RunId {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::PageComplete { run_id, .. }
            | Event::PhaseComplete { run_id, .. }
            | Event::CleanedUp { run_id }
            | Event::RunComplete { run_id, .. }
            | Event::RunFailed { run_id, .. } => *run_id,
        }
    }

    /// Whether this is the last event of its run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::RunComplete { .. } | Event::RunFailed { .. })
    }

    /// Short name used as the SSE event type
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "run_started",
            Event::PageComplete { .. } => "page_complete",
            Event::PhaseComplete { .. } => "phase_complete",
            Event::CleanedUp { .. } => "cleaned_up",
            Event::RunComplete { .. } => "run_complete",
            Event::RunFailed { .. } => "run_failed",
        }
    }

    /// Render the event as plain-text progress lines
    pub fn progress_text(&self) -> String {
        match self {
            Event::RunStarted {
                page_count,
                row_count,
                ..
            } => format!(
                "Starting to write {page_count} pages\nStarting to write {row_count} rows\n"
            ),
            Event::PageComplete { page, .. } => format!("finished writing to {page}\n"),
            Event::PhaseComplete {
                phase, elapsed_ns, ..
            } => format!(
                "{} took: {:?}\n",
                phase.label(),
                std::time::Duration::from_nanos(*elapsed_ns)
            ),
            Event::CleanedUp { .. } => "Cleaned up\n".to_string(),
            Event::RunComplete { summary, .. } => format!(
                "Run {} complete: {} pages merged\n",
                summary.run_id,
                summary.pages.len()
            ),
            Event::RunFailed { error, .. } => format!("Run failed: {error}\n"),
        }
    }
}
