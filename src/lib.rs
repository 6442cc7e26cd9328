mod config;
mod text;
mod records;
mod resume;
mod util;

mod api;
mod reddit;
mod resolver;
mod retry;

mod sink;
mod progress;
mod pipeline;

pub use crate::config::{Credentials, ExportOptions};
pub use crate::pipeline::{CommentExporter, RunSummary, StopReason};

// Row model and parent-reference parsing.
pub use crate::records::{parent_id_from_permalink, CommentRecord, OutputRecord, ParentRef, OUTPUT_HEADER};

// Remote seam: the trait, its data and errors, and the live client.
pub use crate::api::{ApiError, CommentData, RedditApi, SubmissionData};
pub use crate::reddit::RedditClient;

// Parent resolution, exposed for callers that want text without the CSV loop.
pub use crate::resolver::{comment_text, submission_text, Classified, ParentResolver, ParentText, UnavailableReason};

// Building blocks: checkpoint lookup, sanitation, retry, output sink.
pub use crate::resume::last_checkpoint;
pub use crate::text::{is_tombstone, sanitize};
pub use crate::retry::{Retried, RetryPolicy};
pub use crate::sink::{FailFastWriter, OutputSink};

pub use crate::util::{init_tracing_once, init_tracing_with};
