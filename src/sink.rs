//! Append-only output: every field quoted, header only on a fresh file,
//! explicit flush + fsync at batch boundaries.

use crate::records::{OutputRecord, OUTPUT_HEADER};
use crate::resume::output_has_content;
use crate::util::open_append_with_backoff;
use anyhow::{Context, Result};
use csv::{QuoteStyle, Writer, WriterBuilder};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writer that refuses all I/O once a write or flush has failed. The CSV writer
/// may still hold part of the failed record in its buffer; latching here keeps
/// those bytes (and anything after them) out of the file, including the flush
/// the CSV writer attempts on drop.
pub struct FailFastWriter<W> {
    inner: W,
    failed: bool,
}

impl<W> FailFastWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, failed: false }
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    fn guard<T>(&mut self, op: impl FnOnce(&mut W) -> io::Result<T>) -> io::Result<T> {
        if self.failed {
            return Err(io::Error::new(io::ErrorKind::Other, "output writer failed earlier; refusing further writes"));
        }
        match op(&mut self.inner) {
            Err(e) if e.kind() != io::ErrorKind::Interrupted => {
                self.failed = true;
                Err(e)
            }
            res => res,
        }
    }
}

impl<W: Write> Write for FailFastWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard(|w| w.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard(|w| w.flush())
    }
}

pub struct OutputSink {
    path: PathBuf,
    w: Writer<FailFastWriter<File>>,
    rows: u64,
}

impl OutputSink {
    /// Open `path` for appending. A missing or empty file gets the header row first.
    pub fn open(path: &Path) -> Result<Self> {
        let fresh = !output_has_content(path);
        let f = open_append_with_backoff(path, 16, 50)
            .with_context(|| format!("open output {}", path.display()))?;
        let w = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .has_headers(false)
            .from_writer(FailFastWriter::new(f));
        let mut sink = Self { path: path.to_path_buf(), w, rows: 0 };
        if fresh {
            sink.w
                .write_record(OUTPUT_HEADER)
                .with_context(|| format!("write header to {}", path.display()))?;
            sink.sync()?;
        }
        Ok(sink)
    }

    /// Buffer one row. After an error the sink is unusable: every later
    /// append, sync and finish fails without touching the file.
    pub fn append(&mut self, rec: &OutputRecord) -> Result<()> {
        rec.write_to(&mut self.w)?;
        self.rows += 1;
        Ok(())
    }

    /// Push buffered rows to the OS and fsync, so they survive a crash.
    pub fn sync(&mut self) -> Result<()> {
        self.w.flush().with_context(|| format!("flush {}", self.path.display()))?;
        self.w
            .get_ref()
            .get_ref()
            .sync_data()
            .with_context(|| format!("fsync {}", self.path.display()))
    }

    /// Rows appended through this sink (not counting the header).
    pub fn rows_appended(&self) -> u64 {
        self.rows
    }

    pub fn finish(mut self) -> Result<()> {
        self.sync()
    }
}
