//! Raw byte copy merge ("export_copy")

use super::{MergeStrategy, merge_error, source_files};
use crate::error::Result;
use crate::filesystem::open_for_append_async;
use crate::types::MergeReport;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Streams each page's bytes straight into the destination without looking
/// at line boundaries
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyMerge;

impl CopyMerge {
    /// Name of this strategy and of the file it produces
    pub const NAME: &'static str = "export_copy";
}

#[async_trait]
impl MergeStrategy for CopyMerge {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn merge(&self, source_dir: &Path, destination: &Path) -> Result<MergeReport> {
        let files = source_files(source_dir).await?;
        let mut output = open_for_append_async(destination).await?;
        let mut bytes_written = 0u64;

        for path in &files {
            let mut input = tokio::fs::File::open(path)
                .await
                .map_err(|e| merge_error(Self::NAME, path, e))?;
            let copied = tokio::io::copy(&mut input, &mut output)
                .await
                .map_err(|e| merge_error(Self::NAME, path, e))?;
            bytes_written += copied;
            debug!(?path, bytes = copied, "copied page into export");
        }

        output
            .flush()
            .await
            .map_err(|e| merge_error(Self::NAME, destination, e))?;

        info!(
            strategy = Self::NAME,
            files = files.len(),
            bytes = bytes_written,
            "copy merge complete"
        );

        Ok(MergeReport {
            strategy: Self::NAME.to_string(),
            destination: destination.to_path_buf(),
            files_merged: files.len(),
            lines: None,
            bytes_written,
        })
    }
}
