//! Build-progress side channel.
//!
//! Index builds can run for minutes; the builder reports fractional
//! progress (0-100) through a [`ProgressSink`] supplied by the caller. The
//! crate itself never prints.

/// Receives fractional progress updates from a running index build.
pub trait ProgressSink: Send + Sync {
    /// `percent` is monotonically non-decreasing within one build.
    fn update(&self, percent: u8, note: &str);
}

/// Discards all progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _percent: u8, _note: &str) {}
}

/// Adapter driving an `indicatif` progress bar.
#[cfg(feature = "progress")]
pub struct BarProgress(indicatif::ProgressBar);

#[cfg(feature = "progress")]
impl BarProgress {
    pub fn new() -> Self {
        let bar = indicatif::ProgressBar::new(100);
        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/100 {msg}")
        {
            bar.set_style(style);
        }
        Self(bar)
    }

    pub fn finish(&self) {
        self.0.finish_and_clear();
    }
}

#[cfg(feature = "progress")]
impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress")]
impl ProgressSink for BarProgress {
    fn update(&self, percent: u8, note: &str) {
        self.0.set_position(percent as u64);
        self.0.set_message(note.to_string());
    }
}
