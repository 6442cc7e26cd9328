//! Terminal progress: an `indicatif` spinner tracking rows seen, with the
//! processed/skipped split in its message.

use indicatif::{ProgressBar, ProgressStyle};

pub fn make_count_spinner(label: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template(
        "{spinner:.green} {prefix} seen: {pos}  {msg}  rows/s: {per_sec}  elapsed: {elapsed_precise}"
    )
    .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    if let Some(label) = label {
        pb.set_prefix(label.to_string());
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Optional spinner; every method is a no-op when disabled.
pub struct ProgressScope {
    pb: Option<ProgressBar>,
}

impl ProgressScope {
    pub fn new(enabled: bool, label: Option<&str>) -> Self {
        Self { pb: enabled.then(|| make_count_spinner(label)) }
    }

    #[inline]
    pub fn update(&self, seen: u64, processed: u64, skipped: u64) {
        if let Some(pb) = &self.pb {
            pb.set_position(seen);
            pb.set_message(format!("processed: {processed}  skipped: {skipped}"));
        }
    }

    pub fn finish<T: Into<String>>(&self, msg: T) {
        if let Some(pb) = &self.pb {
            pb.finish_with_message(msg.into());
        }
    }
}
