//! The remote seam: two lookups against Reddit, behind a trait so the pipeline
//! can run against the live API or a scripted double.

use std::time::Duration;
use thiserror::Error;

/// Fields of a comment that the exporter uses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentData {
    pub id: String,
    pub body: String,
}

/// Fields of a submission that the exporter uses. `selftext` is empty for link posts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionData {
    pub id: String,
    pub title: String,
    pub selftext: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("access forbidden (private or quarantined)")]
    Forbidden,
    #[error("rate limited by Reddit (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Reddit server error (HTTP {0})")]
    Server(u16),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl ApiError {
    /// Errors worth retrying the whole row for: the service asked us to back off
    /// or failed on its side. Everything else is a property of the parent itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. } | ApiError::Server(_))
    }
}

/// Authenticated access to the two Reddit lookups the exporter needs.
/// Ids are passed without their `t1_` / `t3_` prefix.
pub trait RedditApi {
    fn fetch_comment(&self, id: &str) -> Result<CommentData, ApiError>;
    fn fetch_submission(&self, id: &str) -> Result<SubmissionData, ApiError>;
}

impl<T: RedditApi + ?Sized> RedditApi for &T {
    fn fetch_comment(&self, id: &str) -> Result<CommentData, ApiError> {
        (**self).fetch_comment(id)
    }
    fn fetch_submission(&self, id: &str) -> Result<SubmissionData, ApiError> {
        (**self).fetch_submission(id)
    }
}

impl<T: RedditApi + ?Sized> RedditApi for Box<T> {
    fn fetch_comment(&self, id: &str) -> Result<CommentData, ApiError> {
        (**self).fetch_comment(id)
    }
    fn fetch_submission(&self, id: &str) -> Result<SubmissionData, ApiError> {
        (**self).fetch_submission(id)
    }
}
