use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub input: PathBuf,               // pre-fetched comments CSV (id, body, date, [parent], [link])
    pub output: PathBuf,              // append-only conversations CSV, doubles as checkpoint
    pub batch_size: usize,            // rows between flush+fsync and progress report
    pub max_retries: usize,           // attempts per row on transient API errors
    pub retry_delay: Duration,        // fixed sleep between attempts, no growth
    pub stop_after: Option<u64>,      // cap on processed rows (skips don't count)
    pub progress: bool,               // show terminal spinner
    pub progress_label: Option<String>,

    // IO tuning
    pub read_buffer_bytes: usize,     // BufReader capacity for the input CSV
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from("comments.csv"),
            output: PathBuf::from("conversations.csv"),
            batch_size: 100,
            max_retries: 3,
            retry_delay: Duration::from_secs(60),
            stop_after: None,
            progress: false,
            progress_label: None,
            read_buffer_bytes: 64 * 1024,
        }
    }
}

impl ExportOptions {
    pub fn with_input(mut self, path: impl AsRef<Path>) -> Self {
        self.input = path.as_ref().to_path_buf();
        self
    }
    pub fn with_output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = path.as_ref().to_path_buf();
        self
    }
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }
    pub fn with_max_retries(mut self, n: usize) -> Self {
        self.max_retries = n.max(1);
        self
    }
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
    pub fn with_stop_after(mut self, limit: Option<u64>) -> Self {
        self.stop_after = limit;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
}

pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_USERNAME: &str = "REDDIT_USERNAME";
pub const ENV_PASSWORD: &str = "REDDIT_PASSWORD";
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";

/// Script-app credentials for the Reddit OAuth password grant.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Load credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Load credentials through an arbitrary lookup (env, map, ...).
    /// Empty values count as missing. `REDDIT_USER_AGENT` falls back to
    /// `rcex/<version> by <username>`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Option<String> {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };
        let require = |key: &str| -> Result<String> {
            get(key).ok_or_else(|| anyhow!("missing required environment variable {key}"))
        };

        let client_id = require(ENV_CLIENT_ID)?;
        let client_secret = require(ENV_CLIENT_SECRET)?;
        let username = require(ENV_USERNAME)?;
        let password = require(ENV_PASSWORD)?;
        let user_agent = get(ENV_USER_AGENT)
            .unwrap_or_else(|| format!("rcex/{} by {}", env!("CARGO_PKG_VERSION"), username));

        Ok(Self { client_id, client_secret, username, password, user_agent })
    }
}
