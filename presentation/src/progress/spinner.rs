//! Spinner shown while waiting on the provider

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spins until the first event of a turn arrives.
pub struct WaitingSpinner {
    bar: Option<ProgressBar>,
}

impl WaitingSpinner {
    pub fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    /// No-op spinner for non-interactive output.
    pub fn hidden() -> Self {
        Self { bar: None }
    }

    /// Clear the spinner. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }
}

impl Drop for WaitingSpinner {
    fn drop(&mut self) {
        self.stop();
    }
}
