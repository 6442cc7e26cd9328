use anyhow::{Context, Result};
use clap::Parser;
use rcex::{init_tracing_with, CommentExporter, Credentials, RedditClient, StopReason};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Export Reddit comments to CSV together with the text of each comment's parent.
#[derive(Parser, Debug)]
#[command(name = "rcex", version, about)]
struct Cli {
    /// Reddit username the comments belong to (informational).
    #[arg(long)]
    username: Option<String>,

    /// Input CSV containing comments (columns: id, body, date, [parent], [link]).
    #[arg(long, default_value = "comments.csv")]
    input: PathBuf,

    /// Output CSV; appended to and resumed from when it already exists.
    #[arg(long, default_value = "conversations.csv")]
    output: PathBuf,

    /// Number of comments to process between flushes to disk.
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Maximum number of attempts per comment on Reddit API errors.
    #[arg(long, default_value_t = 3)]
    max_retries: usize,

    /// Delay in seconds between attempts.
    #[arg(long, default_value_t = 60)]
    retry_delay: u64,

    /// Maximum number of comments to process.
    #[arg(long)]
    stop_after: Option<u64>,

    /// Show a terminal spinner.
    #[arg(long)]
    progress: bool,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing_with(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let creds = Credentials::from_env()?;
    if let Some(u) = &cli.username {
        tracing::info!(username = %u, "exporting comments for user");
    }

    let client = RedditClient::connect(creds).context("authenticate with Reddit")?;
    let me = client.me().context("verify Reddit identity")?;
    tracing::info!("Authenticated as: {me}");

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            eprintln!("\nInterrupt received; finishing current row and saving progress...");
        })
        .unwrap_or_else(|e| tracing::warn!(error = %e, "could not install Ctrl-C handler"));
    }

    let summary = CommentExporter::new()
        .input(&cli.input)
        .output(&cli.output)
        .batch_size(cli.batch_size)
        .max_retries(cli.max_retries)
        .retry_delay(Duration::from_secs(cli.retry_delay))
        .stop_after(cli.stop_after)
        .progress(cli.progress)
        .progress_label("Exporting")
        .interrupt_flag(interrupted)
        .run(&client)?;
    if summary.stop == StopReason::OutputError {
        anyhow::bail!("output {} could not be written; rows already on disk are kept", cli.output.display());
    }
    Ok(())
}
