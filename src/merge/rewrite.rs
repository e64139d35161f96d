//! Line-by-line rewrite merge ("export_write")

use super::{MergeStrategy, merge_error, source_files};
use crate::error::Result;
use crate::filesystem::open_for_append_async;
use crate::types::MergeReport;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info};

/// Reads each page line by line and writes every line, plus a newline, to the
/// destination through a buffered writer flushed once per page
///
/// Lines are raw bytes; nothing is decoded or validated.
#[derive(Clone, Copy, Debug, Default)]
pub struct RewriteMerge;

impl RewriteMerge {
    /// Name of this strategy and of the file it produces
    pub const NAME: &'static str = "export_write";
}

#[async_trait]
impl MergeStrategy for RewriteMerge {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn merge(&self, source_dir: &Path, destination: &Path) -> Result<MergeReport> {
        let files = source_files(source_dir).await?;
        let output = open_for_append_async(destination).await?;
        let mut writer = BufWriter::new(output);

        let mut lines_written = 0u64;
        let mut bytes_written = 0u64;

        let mut line = Vec::new();
        for path in &files {
            let input = tokio::fs::File::open(path)
                .await
                .map_err(|e| merge_error(Self::NAME, path, e))?;
            let mut reader = BufReader::new(input);

            loop {
                line.clear();
                let read = reader
                    .read_until(b'\n', &mut line)
                    .await
                    .map_err(|e| merge_error(Self::NAME, path, e))?;
                if read == 0 {
                    break;
                }

                let record = strip_line_ending(&line);
                writer
                    .write_all(record)
                    .await
                    .map_err(|e| merge_error(Self::NAME, destination, e))?;
                writer
                    .write_all(b"\n")
                    .await
                    .map_err(|e| merge_error(Self::NAME, destination, e))?;
                lines_written += 1;
                bytes_written += record.len() as u64 + 1;
            }

            writer
                .flush()
                .await
                .map_err(|e| merge_error(Self::NAME, destination, e))?;
            debug!(?path, "rewrote page into export");
        }

        writer
            .shutdown()
            .await
            .map_err(|e| merge_error(Self::NAME, destination, e))?;

        info!(
            strategy = Self::NAME,
            files = files.len(),
            lines = lines_written,
            bytes = bytes_written,
            "rewrite merge complete"
        );

        Ok(MergeReport {
            strategy: Self::NAME.to_string(),
            destination: destination.to_path_buf(),
            files_merged: files.len(),
            lines: Some(lines_written),
            bytes_written,
        })
    }
}

/// `line` without its trailing `\n` or `\r\n`
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
