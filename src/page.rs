//! Page writer: serializes rows into one newline-delimited page file

use crate::error::PageError;
use crate::filesystem::open_for_append;
use crate::row::RowGenerator;
use crate::types::{Event, PageReport, PageSpec, RunId};
use std::io::{BufWriter, Write};
use std::path::Path;
use tokio::sync::broadcast;
use tracing::debug;

/// Write `row_count` rows produced by `generator` into `directory/page.name`
///
/// Blocking; run it on a blocking-capable thread. Rows are serialized straight
/// into a buffered writer that is flushed once after the last row. The file is
/// closed before this returns. On success a [`Event::PageComplete`] is sent to
/// `events` (a send with no subscribers is not an error).
pub fn write_page<G: RowGenerator>(
    run_id: RunId,
    directory: &Path,
    page: &PageSpec,
    row_count: usize,
    generator: &G,
    events: &broadcast::Sender<Event>,
) -> Result<PageReport, PageError> {
    let file = open_for_append(directory, &page.name).map_err(|source| PageError::Open {
        page: page.name.clone(),
        source,
    })?;

    let io_error = |source| PageError::Io {
        page: page.name.clone(),
        source,
    };

    let mut writer = CountingWriter::new(BufWriter::new(file));

    for row_index in 0..row_count {
        let row = generator.generate(page);
        serde_json::to_writer(&mut writer, &row).map_err(|source| {
            if source.is_io() {
                PageError::Io {
                    page: page.name.clone(),
                    source: std::io::Error::from(source),
                }
            } else {
                PageError::Serialize {
                    page: page.name.clone(),
                    row: row_index,
                    source,
                }
            }
        })?;
        writer.write_all(b"\n").map_err(io_error)?;
    }

    writer.flush().map_err(io_error)?;
    let bytes_written = writer.count;

    // into_inner hands back the file so it is closed here, not at some later drop
    let file = writer.inner.into_inner().map_err(|e| io_error(e.into_error()))?;
    drop(file);

    debug!(run_id = %run_id, page = %page.name, rows = row_count, bytes_written, "page written");

    events
        .send(Event::PageComplete {
            run_id,
            page: page.name.clone(),
            rows: row_count,
            bytes: bytes_written,
        })
        .ok();

    Ok(PageReport {
        name: page.name.clone(),
        rows: row_count,
        bytes_written,
    })
}

/// Writer adapter that counts bytes accepted by the inner writer
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
