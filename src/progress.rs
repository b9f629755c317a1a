use std::io::IsTerminal;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::info;

/// Advisory progress events from a running batch. Implementations must not
/// affect control flow.
pub trait ProgressSink: Send + Sync {
    fn update(&self, processed: usize, total: usize, source_label: &str);

    /// Called once after the batch ends, however it ended.
    fn finish(&self) {}
}

/// Picks the terminal bar for interactive runs and the log sink otherwise
/// (cron jobs, piped output).
pub fn batch_sink(multi: &MultiProgress, source_label: &str, total: usize) -> Box<dyn ProgressSink> {
    if std::io::stderr().is_terminal() {
        Box::new(BarProgress::new(multi, source_label, total))
    } else {
        Box::new(LogProgress::new(500))
    }
}

/// Logs a line every `stride` items and at completion.
pub struct LogProgress {
    stride: usize,
}

impl LogProgress {
    pub fn new(stride: usize) -> Self {
        Self { stride: stride.max(1) }
    }
}

impl ProgressSink for LogProgress {
    fn update(&self, processed: usize, total: usize, source_label: &str) {
        if processed == total || processed % self.stride == 0 {
            info!("[{source_label}] {processed}/{total} apps processed");
        }
    }
}

/// Terminal bar; several batches share one [`MultiProgress`] so concurrent
/// sources render side by side.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(multi: &MultiProgress, source_label: &str, total: usize) -> Self {
        let bar = multi.add(ProgressBar::new(total as u64));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:>14} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .expect("progress bar template")
                .progress_chars("=>-"),
        );
        bar.set_message(source_label.to_string());
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn update(&self, processed: usize, _total: usize, _source_label: &str) {
        self.bar.set_position(processed as u64);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}
