//! Terminal progress for export runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner} [{prefix}] {bar:30} {pos}/{len} {msg}";

/// In-place progress line: one bar per job, advanced per document.
///
/// A hidden reporter keeps counting but draws nothing; used for `--quiet`,
/// `--no-progress` and tests.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Creates a reporter drawing to stderr, or a hidden one when `enabled`
    /// is false.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self::hidden();
        }
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Replaces the status message.
    pub fn report(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    /// Starts counting the documents of a job.
    pub fn begin_job(&self, tag: &str, total: usize) {
        self.bar.reset();
        self.bar.set_prefix(tag.to_string());
        self.bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        self.bar.set_position(0);
        self.bar.set_message("exporting");
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    /// Counts one processed document.
    pub fn advance(&self) {
        self.bar.inc(1);
    }

    pub fn finish_job(&self) {
        self.bar.disable_steady_tick();
        self.bar.set_message("done");
    }

    /// Removes the progress line.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Documents counted in the current job.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
