//! Report output configuration.

use serde::{Deserialize, Serialize};

fn default_output_dir() -> String {
    "reports".to_string()
}

/// Default number of decimals shown in report tables.
const fn default_decimals() -> usize {
    3
}

const fn default_plots() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Directory receiving `.docx` and `.svg` files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Decimals shown for estimates and statistics.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Render boxplots and histograms during `plend run`.
    #[serde(default = "default_plots")]
    pub plots: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            decimals: default_decimals(),
            plots: default_plots(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ReportConfig::default();
        assert_eq!(config.output_dir, "reports");
        assert_eq!(config.decimals, 3);
        assert!(config.plots);
    }
}
