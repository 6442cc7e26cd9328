//! Row types for the input comments CSV and the output conversations CSV,
//! plus parent-reference parsing.

use anyhow::{Context, Result};
use csv::ByteRecord;
use std::borrow::Cow;
use std::fmt;

/// Header of the output file, written once when the file is created.
pub const OUTPUT_HEADER: [&str; 4] = ["timestamp", "comment_id", "comment_body", "parent_text"];

/// Position of the comment identifier in an output row (the checkpoint column).
pub const OUTPUT_ID_COLUMN: usize = 1;

/// One input row. Fields missing from the file (or the row) are empty / `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: String,
    pub body: String,
    pub date: String,
    pub parent: Option<String>,
    pub link: Option<String>,
}

/// Column positions resolved from the input header. Lookups are best-effort:
/// an absent column simply yields an empty value.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputColumns {
    id: Option<usize>,
    body: Option<usize>,
    date: Option<usize>,
    parent: Option<usize>,
    link: Option<usize>,
}

impl InputColumns {
    pub fn from_headers(headers: &ByteRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| trim_bom(h) == name.as_bytes());
        let cols = Self {
            id: find("id"),
            body: find("body"),
            date: find("date"),
            parent: find("parent"),
            link: find("link"),
        };
        for (name, pos) in [("id", cols.id), ("body", cols.body), ("date", cols.date)] {
            if pos.is_none() {
                tracing::warn!(column = name, "input CSV has no '{}' column; values will be empty", name);
            }
        }
        cols
    }

    pub fn has_parent_source(&self) -> bool {
        self.parent.is_some() || self.link.is_some()
    }
}

fn trim_bom(h: &[u8]) -> &[u8] {
    h.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(h)
}

fn field<'a>(rec: &'a ByteRecord, idx: Option<usize>) -> Option<Cow<'a, str>> {
    idx.and_then(|i| rec.get(i)).map(String::from_utf8_lossy)
}

impl CommentRecord {
    /// Decode a raw CSV row. Invalid UTF-8 is replaced, never rejected.
    pub fn from_byte_record(cols: &InputColumns, rec: &ByteRecord) -> Self {
        let opt = |idx| field(rec, idx).map(|s| s.into_owned()).filter(|s| !s.is_empty());
        Self {
            id: field(rec, cols.id).map(|s| s.into_owned()).unwrap_or_default(),
            body: field(rec, cols.body).map(|s| s.into_owned()).unwrap_or_default(),
            date: field(rec, cols.date).map(|s| s.into_owned()).unwrap_or_default(),
            parent: opt(cols.parent),
            link: opt(cols.link),
        }
    }

    /// Parent reference for this row: the explicit `parent` field wins,
    /// otherwise one is derived from `link`.
    pub fn parent_ref(&self) -> Option<ParentRef> {
        if let Some(p) = self.parent.as_deref().and_then(ParentRef::parse) {
            return Some(p);
        }
        self.link
            .as_deref()
            .and_then(parent_id_from_permalink)
            .and_then(ParentRef::parse)
    }
}

/// What a comment replies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// `t1_<id>`
    Comment(String),
    /// `t3_<id>`
    Submission(String),
    /// Bare id; the kind must be probed.
    Untyped(String),
}

impl ParentRef {
    /// Parse `t1_abc`, `t3_abc` or a bare `abc`. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(id) = raw.strip_prefix("t1_") {
            return Some(Self::Comment(id.to_string()));
        }
        if let Some(id) = raw.strip_prefix("t3_") {
            return Some(Self::Submission(id.to_string()));
        }
        Some(Self::Untyped(raw.to_string()))
    }

    /// The id without its type prefix.
    pub fn id(&self) -> &str {
        match self {
            Self::Comment(id) | Self::Submission(id) | Self::Untyped(id) => id,
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(id) => write!(f, "t1_{id}"),
            Self::Submission(id) => write!(f, "t3_{id}"),
            Self::Untyped(id) => f.write_str(id),
        }
    }
}

/// Parent id carried by a permalink: its last path segment, ignoring trailing slashes.
/// `.../comments/abc123/title_slug/def456/` -> `def456`.
pub fn parent_id_from_permalink(link: &str) -> Option<&str> {
    let trimmed = link.trim().trim_end_matches('/');
    let (_, last) = trimmed.rsplit_once('/')?;
    Some(last).filter(|s| !s.is_empty())
}

/// One row of the output file. Written once, never rewritten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRecord {
    pub timestamp: String,
    pub comment_id: String,
    pub comment_body: String,
    pub parent_text: String,
}

impl OutputRecord {
    pub fn fields(&self) -> [&str; 4] {
        [self.timestamp.as_str(), self.comment_id.as_str(), self.comment_body.as_str(), self.parent_text.as_str()]
    }

    pub fn write_to<W: std::io::Write>(&self, w: &mut csv::Writer<W>) -> Result<()> {
        w.write_record(self.fields())
            .with_context(|| format!("write output row for comment {}", self.comment_id))
    }
}
