//! Progress indicator internals.
//!
//! The bundle exposes the lifecycle (`start_progress_indicator*`,
//! `stop_progress_indicator`); this module wraps the spinner itself.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Animation frames; the final frame is what indicatif shows on finish.
const TICK_CHARS: &str = "⣾⣽⣻⢿⡿⣟⣯⣷⣿";

const TICK_INTERVAL: Duration = Duration::from_millis(120);

/// A spinner drawn on the error stream while an operation is in flight.
///
/// Created lazily on first start, label-updatable while running, stopped
/// and discarded rather than restarted in place.
pub(crate) struct Spinner {
    bar: ProgressBar,
}

impl std::fmt::Debug for Spinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spinner").finish_non_exhaustive()
    }
}

impl Spinner {
    /// Start a new spinner with the given label.
    pub(crate) fn start(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{prefix}{spinner:.cyan}")
            .map(|style| style.tick_chars(TICK_CHARS))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_prefix(prefix_for(label));
        bar.enable_steady_tick(TICK_INTERVAL);
        Self { bar }
    }

    /// Swap the label in place, without restarting the animation.
    pub(crate) fn set_label(&self, label: &str) {
        self.bar.set_prefix(prefix_for(label));
    }

    /// Stop the animation and erase it from the terminal.
    pub(crate) fn stop(self) {
        self.bar.finish_and_clear();
    }
}

fn prefix_for(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("{label} ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_separate_label_from_spinner() {
        assert_eq!(prefix_for("Fetching"), "Fetching ");
        assert_eq!(prefix_for(""), "");
    }

    #[test]
    fn test_should_update_label_in_place() {
        // Draws to a hidden target in non-TTY test runs, so this only
        // exercises the state transitions.
        let spinner = Spinner::start("one");
        spinner.set_label("two");
        spinner.set_label("");
        spinner.stop();
    }
}
