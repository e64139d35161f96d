//! # page-forge
//!
//! Concurrent page generation and merge pipeline.
//!
//! A run writes synthetic rows into many page files in parallel, waits for
//! every page to finish, then consolidates the pages into single export files
//! using two strategies (line rewrite and raw byte copy), timing each phase.
//!
//! ## Design
//!
//! - **Explicit configuration** - a [`Config`] value is handed to the [`Pipeline`]
//! - **Bounded fan-out** - one worker per page, capped by `max_concurrent_pages`
//! - **Recoverable errors** - failures come back as [`Error`], never abort the process
//! - **Event-driven** - consumers subscribe to [`Event`]s instead of the core
//!   writing progress text itself
//!
//! ## Quick Start
//!
//! ```no_run
//! use page_forge::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.pipeline.page_count = 8;
//!     config.pipeline.row_count = 500;
//!
//!     let pipeline = Pipeline::new(config)?;
//!
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             print!("{}", event.progress_text());
//!         }
//!     });
//!
//!     let summary = pipeline.run_new().await?;
//!     println!("merged {} pages", summary.pages.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Run folder lifecycle
pub mod filesystem;
/// Merge strategies
pub mod merge;
/// Bounded page fan-out
pub mod orchestrator;
/// Page writer
pub mod page;
/// End-to-end run
pub mod pipeline;
/// Row generation
pub mod row;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, FolderError, MergeError, PageError, Result, ToHttpStatus};
pub use merge::{CopyMerge, MergeStrategy, RewriteMerge};
pub use orchestrator::{PageOrchestrator, PagesSummary};
pub use pipeline::Pipeline;
pub use row::{Row, RowGenerator, UuidRowGenerator};
pub use types::{Event, MergeReport, PageReport, PageSpec, Phase, PhaseTiming, RunId, RunSummary};

/// Resolve on Ctrl+C, or on SIGTERM where the platform has it
///
/// Used as the graceful shutdown trigger of the API server.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for Ctrl+C only");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}
