use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{GlobalFlags, OutputFormat};

/// Terminal decisions made once at startup.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiPrefs {
    /// Color p values in table mode.
    pub table_color: bool,
    /// Draw the bootstrap bar on stderr.
    pub progress: bool,
    pub term_width: Option<usize>,
}

static PREFS: OnceLock<UiPrefs> = OnceLock::new();

impl UiPrefs {
    fn detect(flags: &GlobalFlags) -> Self {
        let colors_allowed = std::env::var_os("NO_COLOR").is_none();
        Self {
            table_color: flags.format == OutputFormat::Table
                && colors_allowed
                && std::io::stdout().is_terminal(),
            progress: !flags.quiet && std::io::stderr().is_terminal(),
            term_width: std::env::var("COLUMNS")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|width| *width >= 40),
        }
    }
}

pub fn init(flags: &GlobalFlags) {
    let _ = PREFS.set(UiPrefs::detect(flags));
}

/// Prefs from [`init`], or plain output when it has not run (unit tests).
#[must_use]
pub fn prefs() -> UiPrefs {
    PREFS.get().copied().unwrap_or_default()
}
