//! Error types for page-forge
//!
//! This module provides the error taxonomy for the pipeline:
//! - Page generation failures (row serialization, page file I/O)
//! - Merge failures (reading a page, writing the export)
//! - Folder lifecycle failures (remake, open, remove)
//! - HTTP status code mapping and structured JSON bodies for the API

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for page-forge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for page-forge
///
/// Every failure in the write, merge and cleanup path ends up here. Nothing in
/// the pipeline aborts the process; callers decide how to surface the error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_pages")
        key: Option<String>,
    },

    /// I/O error outside of a page, merge or folder operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more pages failed; every page was still given the chance to finish
    #[error("{} of {total} pages failed, first failure: {}", .failures.len(), first_failure(.failures))]
    PagesFailed {
        /// Total number of pages scheduled for the run
        total: usize,
        /// One entry per failed page, ordered by page index
        failures: Vec<PageError>,
    },

    /// Merge strategy failed
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    /// Folder lifecycle operation failed
    #[error("folder error: {0}")]
    Folder(#[from] FolderError),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

fn first_failure(failures: &[PageError]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

/// Errors raised while writing a single page
#[derive(Debug, Error)]
pub enum PageError {
    /// A generated row could not be serialized
    #[error("failed to serialize row {row} of page {page}: {source}")]
    Serialize {
        /// The page being written
        page: String,
        /// Zero-based row index within the page
        row: usize,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },

    /// Opening, writing or flushing the page file failed
    #[error("I/O failure on page {page}: {source}")]
    Io {
        /// The page being written
        page: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The page file could not be opened
    #[error("failed to open page {page}: {source}")]
    Open {
        /// The page being written
        page: String,
        /// Underlying folder error
        #[source]
        source: FolderError,
    },

    /// The worker running this page panicked or was aborted
    #[error("page worker for {page} did not finish: {reason}")]
    Panicked {
        /// The page the worker was assigned
        page: String,
        /// Panic or cancellation message
        reason: String,
    },
}

impl PageError {
    /// Name of the page this error belongs to
    pub fn page(&self) -> &str {
        match self {
            PageError::Serialize { page, .. }
            | PageError::Io { page, .. }
            | PageError::Open { page, .. }
            | PageError::Panicked { page, .. } => page,
        }
    }
}

/// Errors raised by a merge strategy
#[derive(Debug, Error)]
#[error("{strategy} failed on {path}: {source}")]
pub struct MergeError {
    /// Strategy name ("export_write" or "export_copy")
    pub strategy: &'static str,
    /// The file being read or written when the failure happened
    pub path: PathBuf,
    /// Underlying I/O error
    #[source]
    pub source: std::io::Error,
}

/// Folder lifecycle errors
#[derive(Debug, Error)]
pub enum FolderError {
    /// Removing or recreating a folder failed
    #[error("failed to remake folder {path}: {source}")]
    Remake {
        /// The folder being recreated
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Opening a file for append failed
    #[error("failed to open {path} for append: {source}")]
    Open {
        /// The file being opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Recursive removal failed
    #[error("failed to remove {path}: {source}")]
    Remove {
        /// The path being removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Listing a folder failed
    #[error("failed to list {path}: {source}")]
    List {
        /// The folder being listed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "pages_failed",
///     "message": "1 of 5 pages failed, first failure: ...",
///     "details": {
///       "failed_pages": ["page_3"]
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "merge_failed")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context (failed pages, paths)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - rejected before a run starts
            Error::Config { .. } => 400,

            // 500 Internal Server Error - a run failed part way
            Error::Io(_)
            | Error::PagesFailed { .. }
            | Error::Merge(_)
            | Error::Folder(_)
            | Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::PagesFailed { .. } => "pages_failed",
            Error::Merge(_) => "merge_failed",
            Error::Folder(e) => match e {
                FolderError::Remake { .. } => "folder_remake_failed",
                FolderError::Open { .. } => "file_open_failed",
                FolderError::Remove { .. } => "cleanup_failed",
                FolderError::List { .. } => "folder_list_failed",
            },
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let mut api_error = ApiError::new(error.error_code(), error.to_string());

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::PagesFailed { total, failures } => Some(serde_json::json!({
                "total_pages": total,
                "failed_pages": failures.iter().map(PageError::page).collect::<Vec<_>>(),
            })),
            Error::Merge(e) => Some(serde_json::json!({
                "strategy": e.strategy,
                "path": e.path,
            })),
            Error::Folder(
                FolderError::Remake { path, .. }
                | FolderError::Open { path, .. }
                | FolderError::Remove { path, .. }
                | FolderError::List { path, .. },
            ) => Some(serde_json::json!({
                "path": path,
            })),
            _ => None,
        };

        api_error.error.details = details;
        api_error
    }
}
