//! Parent resolution: turn a `ParentRef` into display text, or into an
//! explicit "unavailable" outcome when the parent is gone or unreachable.

use crate::api::{ApiError, CommentData, RedditApi, SubmissionData};
use crate::records::ParentRef;
use crate::text::{is_tombstone, sanitize};

/// Result of probing a bare id against both namespaces.
/// The first namespace that answers wins (comments are tried before submissions).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    Comment(CommentData),
    Submission(SubmissionData),
    Unknown,
}

/// Why a parent produced no text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The named field holds `[deleted]` or `[removed]`.
    Tombstone { field: &'static str },
    /// Neither a comment nor a submission answered to a bare id.
    Unclassified,
    /// The lookup itself failed (missing, private, network, ...).
    Fetch(ApiError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentText {
    Available(String),
    Unavailable(UnavailableReason),
}

impl ParentText {
    pub fn into_text(self) -> Option<String> {
        match self {
            ParentText::Available(s) => Some(s),
            ParentText::Unavailable(_) => None,
        }
    }
    pub fn is_available(&self) -> bool {
        matches!(self, ParentText::Available(_))
    }
}

pub struct ParentResolver<A> {
    api: A,
}

impl<A: RedditApi> ParentResolver<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Resolve a parent, never failing: every error becomes `Unavailable`.
    pub fn resolve(&self, parent: &ParentRef) -> ParentText {
        match self.try_resolve(parent) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(parent_id = %parent, error = %e, "Error getting parent text");
                ParentText::Unavailable(UnavailableReason::Fetch(e))
            }
        }
    }

    /// Resolve a parent, surfacing only transient service errors (rate limiting,
    /// 5xx) so the caller can retry. Missing, forbidden and otherwise failed
    /// lookups come back as `Unavailable`.
    pub fn try_resolve(&self, parent: &ParentRef) -> Result<ParentText, ApiError> {
        match parent {
            ParentRef::Comment(id) => match self.api.fetch_comment(id) {
                Ok(c) => Ok(comment_text(&c)),
                Err(e) => degrade(parent, e),
            },
            ParentRef::Submission(id) => match self.api.fetch_submission(id) {
                Ok(s) => Ok(submission_text(&s)),
                Err(e) => degrade(parent, e),
            },
            ParentRef::Untyped(id) => Ok(match self.classify(id)? {
                Classified::Comment(c) => comment_text(&c),
                Classified::Submission(s) => submission_text(&s),
                Classified::Unknown => ParentText::Unavailable(UnavailableReason::Unclassified),
            }),
        }
    }

    /// Probe a bare id: comment first, then submission. Any comment-side failure
    /// moves on to the submission probe; only a transient error from that last
    /// probe is returned.
    pub fn classify(&self, id: &str) -> Result<Classified, ApiError> {
        match self.api.fetch_comment(id) {
            Ok(c) => return Ok(Classified::Comment(c)),
            Err(e) => tracing::debug!(parent_id = id, error = %e, "not a comment; probing as submission"),
        }
        match self.api.fetch_submission(id) {
            Ok(s) => Ok(Classified::Submission(s)),
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                tracing::info!(parent_id = id, error = %e, "Could not determine type of parent with ID {}", id);
                Ok(Classified::Unknown)
            }
        }
    }
}

fn degrade(parent: &ParentRef, e: ApiError) -> Result<ParentText, ApiError> {
    if e.is_transient() {
        return Err(e);
    }
    tracing::info!(parent_id = %parent, error = %e, "Error getting parent text for parent ID {}", parent);
    Ok(ParentText::Unavailable(UnavailableReason::Fetch(e)))
}

/// Sanitized comment body; tombstoned bodies are unavailable.
pub fn comment_text(c: &CommentData) -> ParentText {
    let body = sanitize(&c.body);
    if is_tombstone(&body) {
        return ParentText::Unavailable(UnavailableReason::Tombstone { field: "body" });
    }
    ParentText::Available(body.into_owned())
}

/// Sanitized title, followed by the self-text on its own line when present.
/// A tombstone in either field makes the whole parent unavailable.
pub fn submission_text(s: &SubmissionData) -> ParentText {
    let title = sanitize(&s.title);
    let selftext = sanitize(&s.selftext);

    let field = if is_tombstone(&title) {
        Some("title")
    } else if is_tombstone(&selftext) {
        Some("selftext")
    } else {
        None
    };
    if let Some(field) = field {
        tracing::info!(
            submission_id = %s.id, field, title = %title, selftext = %selftext,
            "Skipping comment with deleted parent submission"
        );
        return ParentText::Unavailable(UnavailableReason::Tombstone { field });
    }

    if selftext.is_empty() {
        ParentText::Available(title.into_owned())
    } else {
        ParentText::Available(format!("{title}\n{selftext}"))
    }
}
