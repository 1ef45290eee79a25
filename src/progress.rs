// ABOUTME: Size-based progress tracking for a running dump
// ABOUTME: Turns observed output sizes into non-negative deltas and renders them

use indicatif::{ProgressBar, ProgressState as BarState, ProgressStyle};
use std::fmt::{self, Write as _};
use std::time::Duration;

use crate::utils::{bytes_to_megabytes, megabytes_to_bytes};

const BAR_TEMPLATE: &str = "{msg} {percent:>3}%|{wide_bar:.cyan/blue}| {mb_pos}/{mb_len} [{elapsed_precise}<{eta_precise}, {mb_per_sec}]";

/// Last and current observed output size, in megabytes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressState {
    pub previous_mb: f64,
    pub current_mb: f64,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new observed size and return the growth since the last one
    ///
    /// The returned delta is never negative. If the file appears to shrink the
    /// high-water mark is kept, so later growth is only counted once.
    pub fn observe(&mut self, observed_mb: f64) -> f64 {
        self.previous_mb = self.current_mb;
        if observed_mb > self.current_mb {
            self.current_mb = observed_mb;
        }
        self.current_mb - self.previous_mb
    }
}

/// Receiver of incremental progress against a fixed estimated total
pub trait ProgressSink {
    /// Report growth of `delta_mb` since the previous report
    fn advance(&mut self, delta_mb: f64);

    /// Mark the tracked work as finished
    fn finish(&mut self, message: &str);
}

/// Terminal progress bar showing MB written against the estimate
pub struct DumpProgressBar {
    bar: ProgressBar,
    reported_mb: f64,
}

impl DumpProgressBar {
    /// Create a bar for `total_mb`; a hidden bar still tracks position
    pub fn new(total_mb: f64, enabled: bool) -> Self {
        let total_bytes = megabytes_to_bytes(total_mb);
        let bar = if enabled {
            ProgressBar::new(total_bytes)
        } else {
            let hidden = ProgressBar::hidden();
            hidden.set_length(total_bytes);
            hidden
        };
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .with_key("mb_pos", write_position_mb)
                .with_key("mb_len", write_length_mb)
                .with_key("mb_per_sec", write_rate_mb)
                .progress_chars("#>-"),
        );
        bar.set_message("Backup Progress");
        if enabled {
            bar.enable_steady_tick(Duration::from_millis(250));
        }

        Self {
            bar,
            reported_mb: 0.0,
        }
    }

    /// Megabytes reported so far
    pub fn reported_mb(&self) -> f64 {
        self.reported_mb
    }

    /// Bar length in bytes, the estimate the bar measures against
    pub fn length_bytes(&self) -> Option<u64> {
        self.bar.length()
    }
}

/// Render a byte count the way the bar shows sizes, e.g. `1.50 MB`
pub(crate) fn format_bar_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes_to_megabytes(bytes))
}

fn write_position_mb(state: &BarState, w: &mut dyn fmt::Write) {
    let _ = w.write_str(&format_bar_megabytes(state.pos()));
}

fn write_length_mb(state: &BarState, w: &mut dyn fmt::Write) {
    let _ = w.write_str(&format_bar_megabytes(state.len().unwrap_or(0)));
}

fn write_rate_mb(state: &BarState, w: &mut dyn fmt::Write) {
    let _ = write!(w, "{:.2} MB/s", state.per_sec() / (1024.0 * 1024.0));
}

impl ProgressSink for DumpProgressBar {
    fn advance(&mut self, delta_mb: f64) {
        if delta_mb <= 0.0 {
            return;
        }
        self.reported_mb += delta_mb;
        // Over-estimate sizes are shown as-is; the position may pass the length
        self.bar.set_position(megabytes_to_bytes(self.reported_mb));
    }

    fn finish(&mut self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
