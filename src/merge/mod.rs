//! Merging page files into a single export file
//!
//! Two interchangeable strategies share the [`MergeStrategy`] contract:
//! 1. [`RewriteMerge`] ("export_write") - reads every page line by line and
//!    writes each line back out, leaving room for per-record transformation
//! 2. [`CopyMerge`] ("export_copy") - streams raw bytes, no line parsing
//!
//! Both visit the regular files directly inside the source folder in file
//! name order and preserve line order within each file, so for the same input
//! they produce byte-identical output.

use crate::error::{Error, MergeError, Result};
use crate::filesystem::list_page_files;
use crate::types::MergeReport;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

mod copy;
mod rewrite;

pub use copy::CopyMerge;
pub use rewrite::RewriteMerge;

/// Strategy for consolidating a folder of page files into one destination
///
/// The destination is opened once, in append mode, and every page is added
/// to it in turn. Any read or write failure aborts the whole merge.
///
/// # Examples
///
/// ```no_run
/// use page_forge::merge::{CopyMerge, MergeStrategy};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = CopyMerge
///     .merge(Path::new("pages/run"), Path::new("builds/run/export_copy"))
///     .await?;
/// println!("merged {} files", report.files_merged);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MergeStrategy: Send + Sync {
    /// Strategy name, also used as the destination file name by the pipeline
    fn name(&self) -> &'static str;

    /// Append every page in `source_dir` to `destination`
    async fn merge(&self, source_dir: &Path, destination: &Path) -> Result<MergeReport>;
}

/// Page files to merge, in the order both strategies visit them
async fn source_files(source_dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_page_files(source_dir).await?)
}

fn merge_error(strategy: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::Merge(MergeError {
        strategy,
        path: path.to_path_buf(),
        source,
    })
}
