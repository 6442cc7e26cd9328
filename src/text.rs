//! Text hygiene: strip non-printable control characters, detect deleted/removed markers.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

pub const DELETED: &str = "[deleted]";
pub const REMOVED: &str = "[removed]";

fn control_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // C0 controls and DEL; tab (09), LF (0A) and CR (0D) are kept.
    RE.get_or_init(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("static regex"))
}

/// Remove control characters U+0000–U+0008, U+000B–U+000C, U+000E–U+001F and U+007F.
/// Tabs, newlines, carriage returns and every other character are preserved. Idempotent.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    control_chars().replace_all(text, "")
}

/// True when `text` is exactly one of Reddit's tombstone markers.
#[inline]
pub fn is_tombstone(text: &str) -> bool {
    text == DELETED || text == REMOVED
}
