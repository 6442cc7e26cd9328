//! Resume locator: the output file is its own checkpoint. The id column of its
//! last data row is where a new run picks up.

use crate::records::OUTPUT_ID_COLUMN;
use crate::util::open_with_backoff;
use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::fs;
use std::io::BufReader;
use std::path::Path;

/// True when `path` exists and holds at least one byte.
pub fn output_has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

/// Identifier of the last comment recorded in `output`, or `None` when the file
/// is absent, empty, header-only or unreadable. Read failures are logged and
/// degrade to "start from the beginning".
pub fn last_checkpoint(output: &Path) -> Option<String> {
    if !output_has_content(output) {
        return None;
    }
    match scan_last_id(output) {
        Ok(Some(id)) => {
            tracing::info!(comment_id = %id, "Resuming from comment ID: {}", id);
            Some(id)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(path = %output.display(), error = %format!("{e:#}"), "Error reading existing output; starting from the beginning");
            None
        }
    }
}

fn scan_last_id(output: &Path) -> Result<Option<String>> {
    let f = open_with_backoff(output, 16, 50).with_context(|| format!("open {}", output.display()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true) // first row is always treated as the header
        .flexible(true)
        .from_reader(BufReader::new(f));

    let mut last: Option<String> = None;
    let mut rec = ByteRecord::new();
    while rdr
        .read_byte_record(&mut rec)
        .with_context(|| format!("read {}", output.display()))?
    {
        if let Some(id) = rec.get(OUTPUT_ID_COLUMN) {
            last = Some(String::from_utf8_lossy(id).into_owned());
        }
    }
    Ok(last.filter(|id| !id.is_empty()))
}
