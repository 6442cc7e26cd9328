use crate::api::RedditApi;
use crate::config::ExportOptions;
use crate::progress::ProgressScope;
use crate::records::{CommentRecord, InputColumns, OutputRecord};
use crate::resolver::{ParentResolver, ParentText};
use crate::resume::last_checkpoint;
use crate::retry::{Retried, RetryPolicy};
use crate::sink::OutputSink;
use crate::text::sanitize;
use crate::util::{init_tracing_once, open_with_backoff};
use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Skips are reported in batches of this size.
const SKIP_REPORT_EVERY: u64 = 10;

/// Why the run loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Input exhausted.
    Completed,
    /// `stop_after` rows were processed.
    StopAfter,
    /// The interrupt flag was raised.
    Interrupted,
    /// Reading the input failed part-way; rows before the failure were kept.
    InputError,
    /// Writing or flushing the output failed; the writer refuses further rows.
    OutputError,
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub processed: u64,
    pub skipped: u64,
    pub total_seen: u64,
    pub batches_flushed: u64,
    /// Checkpoint id read from the output file, if any.
    pub resumed_from: Option<String>,
    /// Whether the checkpoint row was located in the input.
    pub checkpoint_found: bool,
    pub stop: StopReason,
    pub started_at: OffsetDateTime,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Processed rows per second of wall time.
    pub fn rate(&self) -> f64 {
        rate(self.processed, self.elapsed)
    }
}

fn rate(n: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { n as f64 / secs } else { 0.0 }
}

/// Resumable comment → parent exporter. Configure with the builder methods,
/// then `run` it against any `RedditApi`.
#[derive(Clone)]
pub struct CommentExporter {
    pub(crate) opts: ExportOptions,
    interrupt: Arc<AtomicBool>,
}

impl Default for CommentExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentExporter {
    pub fn new() -> Self {
        Self { opts: ExportOptions::default(), interrupt: Arc::new(AtomicBool::new(false)) }
    }

    // -------- Builder methods --------
    pub fn input(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_input(path); self }
    pub fn output(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output(path); self }
    pub fn batch_size(mut self, n: usize) -> Self { self.opts = self.opts.with_batch_size(n); self }
    pub fn max_retries(mut self, n: usize) -> Self { self.opts = self.opts.with_max_retries(n); self }
    pub fn retry_delay(mut self, d: Duration) -> Self { self.opts = self.opts.with_retry_delay(d); self }
    pub fn stop_after(mut self, limit: Option<u64>) -> Self { self.opts = self.opts.with_stop_after(limit); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }

    /// Share an externally owned interrupt flag (e.g. set from a Ctrl-C handler).
    pub fn interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self { self.interrupt = flag; self }

    pub fn options(&self) -> &ExportOptions {
        &self.opts
    }

    /// Process the input file, appending one output row per comment whose parent
    /// text resolves. Resumes after the last id already in the output file.
    ///
    /// Only setup failures (unopenable input/output) are returned as errors.
    /// Per-row lookup problems are logged and counted as skipped; a failed
    /// output write ends the run with `StopReason::OutputError`.
    pub fn run<A: RedditApi>(&self, api: A) -> Result<RunSummary> {
        init_tracing_once();
        let opts = &self.opts;
        let started_at = OffsetDateTime::now_utc();
        let start = Instant::now();

        let input = open_with_backoff(&opts.input, 16, 50)
            .with_context(|| format!("open input {}", opts.input.display()))?;
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::with_capacity(opts.read_buffer_bytes, input));
        let headers = rdr
            .byte_headers()
            .with_context(|| format!("read header of {}", opts.input.display()))?
            .clone();
        let cols = InputColumns::from_headers(&headers);
        if !cols.has_parent_source() {
            tracing::warn!("input has neither 'parent' nor 'link' column; every row will be skipped");
        }

        let checkpoint = last_checkpoint(&opts.output);
        let mut sink = OutputSink::open(&opts.output)?;

        tracing::info!(
            input = %opts.input.display(), output = %opts.output.display(),
            started_at = %started_at.format(&Rfc3339).unwrap_or_default(),
            "Exporting comments with parent text"
        );

        let resolver = ParentResolver::new(api);
        let policy = RetryPolicy::new(opts.max_retries, opts.retry_delay);
        let progress = ProgressScope::new(opts.progress, opts.progress_label.as_deref());

        let mut st = RunState {
            processed: 0,
            skipped: 0,
            total_seen: 0,
            batches_flushed: 0,
            seeking: checkpoint.is_some(),
        };
        let mut stop = StopReason::Completed;
        let mut raw = ByteRecord::new();

        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                tracing::info!("Interrupted by user. Progress has been saved.");
                stop = StopReason::Interrupted;
                break;
            }
            match rdr.read_byte_record(&mut raw) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Error reading input; stopping");
                    stop = StopReason::InputError;
                    break;
                }
            }
            st.total_seen += 1;
            let row = CommentRecord::from_byte_record(&cols, &raw);

            if st.seeking {
                if Some(row.id.as_str()) == checkpoint.as_deref() {
                    st.seeking = false;
                    tracing::info!(comment_id = %row.id, "Found last processed comment (ID: {})", row.id);
                }
                continue;
            }

            if let Some(limit) = opts.stop_after {
                if st.processed >= limit {
                    tracing::info!("Reached stop-after limit of {} comments", limit);
                    stop = StopReason::StopAfter;
                    break;
                }
            }

            let Some(parent) = row.parent_ref() else {
                st.skip("missing parent IDs");
                progress.update(st.total_seen, st.processed, st.skipped);
                continue;
            };

            let parent_text = match policy.run(&self.interrupt, &row.id, || resolver.try_resolve(&parent)) {
                Retried::Done(ParentText::Available(text)) => text,
                Retried::Done(ParentText::Unavailable(reason)) => {
                    tracing::debug!(comment_id = %row.id, parent_id = %parent, ?reason, "parent unavailable");
                    st.skip("missing/deleted parents");
                    progress.update(st.total_seen, st.processed, st.skipped);
                    continue;
                }
                Retried::Exhausted(e) => {
                    tracing::error!(
                        comment_id = %row.id, parent_id = %parent, error = %e,
                        "Failed to process comment after {} retries: {}", policy.max_attempts, e
                    );
                    st.skip("failed lookups");
                    progress.update(st.total_seen, st.processed, st.skipped);
                    continue;
                }
                Retried::Interrupted => {
                    tracing::info!("Interrupted by user. Progress has been saved.");
                    stop = StopReason::Interrupted;
                    break;
                }
            };

            let out = OutputRecord {
                timestamp: row.date,
                comment_body: sanitize(&row.body).into_owned(),
                comment_id: row.id,
                parent_text,
            };
            if let Err(e) = sink.append(&out) {
                tracing::error!(comment_id = %out.comment_id, error = %format!("{e:#}"), "Error writing output; stopping");
                stop = StopReason::OutputError;
                break;
            }
            st.processed += 1;

            if st.processed % opts.batch_size as u64 == 0 {
                if let Err(e) = sink.sync() {
                    tracing::error!(error = %format!("{e:#}"), "Failed to flush output batch; stopping");
                    stop = StopReason::OutputError;
                    break;
                }
                st.batches_flushed += 1;
                tracing::info!(
                    "Processed {} comments (Total seen: {}, Skipped: {}, Rate: {:.2} comments/sec)",
                    st.processed, st.total_seen, st.skipped, rate(st.processed, start.elapsed())
                );
            }
            progress.update(st.total_seen, st.processed, st.skipped);
        }

        if let Err(e) = sink.finish() {
            tracing::error!(error = %format!("{e:#}"), "Failed to flush output on exit");
        }
        if st.seeking {
            if let Some(id) = &checkpoint {
                tracing::warn!(comment_id = %id, "Checkpoint id never appeared in the input; nothing was processed");
            }
        }

        let elapsed = start.elapsed();
        let summary = RunSummary {
            processed: st.processed,
            skipped: st.skipped,
            total_seen: st.total_seen,
            batches_flushed: st.batches_flushed,
            checkpoint_found: checkpoint.is_some() && !st.seeking,
            resumed_from: checkpoint,
            stop,
            started_at,
            elapsed,
        };
        progress.finish("done");
        tracing::info!(
            "Completed. Processed {} comments, skipped {} with missing/deleted parents (Total seen: {}) in {:.2} seconds ({:.2} comments/sec).",
            summary.processed, summary.skipped, summary.total_seen, elapsed.as_secs_f64(), summary.rate()
        );
        Ok(summary)
    }
}

struct RunState {
    processed: u64,
    skipped: u64,
    total_seen: u64,
    batches_flushed: u64,
    seeking: bool,
}

impl RunState {
    fn skip(&mut self, what: &str) {
        self.skipped += 1;
        if self.skipped % SKIP_REPORT_EVERY == 0 {
            tracing::info!(
                "Skipped {} comments with {} (Total seen: {})",
                self.skipped, what, self.total_seen
            );
        }
    }
}
