//! indicatif progress bar for bulk archive deletion.

use std::sync::atomic::{AtomicUsize, Ordering};

use glacier_core::domain::ArchiveId;
use glacier_core::ports::DeleteProgress;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} archives {msg}";

pub struct BarProgress {
    bar: ProgressBar,
    failed: AtomicUsize,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self {
            bar,
            failed: AtomicUsize::new(0),
        }
    }

    /// Bar that draws nothing, for non-interactive output and tests.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            failed: AtomicUsize::new(0),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl DeleteProgress for BarProgress {
    fn on_attempt(&self, _archive_id: &ArchiveId, ok: bool, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
        if !ok {
            let failed = self.failed.fetch_add(1, Ordering::Relaxed) + 1;
            self.bar.set_message(format!("({failed} failed)"));
        }
    }

    fn on_finish(&self) {
        self.bar.finish();
    }
}
