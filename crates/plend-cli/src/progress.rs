use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::ui;

/// Bootstrap resample counter on stderr; inert when progress is disabled.
pub struct BootstrapProgress {
    bar: Option<ProgressBar>,
}

fn bar_template(width: Option<usize>) -> &'static str {
    match width {
        Some(cols) if cols >= 100 => {
            "{msg} {bar:40.cyan/blue} {pos}/{len} resamples ({per_sec}, eta {eta})"
        }
        Some(cols) if cols >= 70 => "{msg} {wide_bar:.cyan/blue} {pos}/{len}",
        _ => "{msg} {wide_bar:.cyan/blue} {percent}%",
    }
}

impl BootstrapProgress {
    #[must_use]
    pub fn start(resamples: usize, model: &str) -> Self {
        let prefs = ui::prefs();
        if !prefs.progress || resamples == 0 {
            return Self { bar: None };
        }

        let bar = ProgressBar::with_draw_target(
            Some(resamples as u64),
            ProgressDrawTarget::stderr(),
        );
        bar.set_style(
            ProgressStyle::with_template(bar_template(prefs.term_width))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(model.to_string());
        Self { bar: Some(bar) }
    }

    /// Record `finished` more resamples. Safe to call from worker threads.
    pub fn advance(&self, finished: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(finished);
        }
    }

    pub fn done(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn failed(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message("bootstrap failed");
        }
    }
}
