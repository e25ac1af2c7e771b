//! Output file naming.
//!
//! | Artifact              | File                          |
//! |-----------------------|-------------------------------|
//! | `Model`               | `Model_<id>_Summary.docx`     |
//! | `Comparison(TTest)`   | `TTest_Results_<id>.docx`     |
//! | `Comparison(Anova)`   | `ANOVA_Results_<id>.docx`     |
//! | `Summary`             | `<id>_Summary.docx`           |
//! | `Results`             | `<id>_Results.docx`           |
//! | `Boxplot`             | `<id>_boxplot.svg`            |
//! | `Histogram`           | `<id>_histogram.svg`          |

use std::fmt;
use std::path::{Path, PathBuf};

use plend_stats::GroupTest;

/// Which test a group comparison ran; names its results file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    TTest,
    Anova,
}

impl TestKind {
    #[must_use]
    pub const fn of(test: &GroupTest) -> Self {
        match test {
            GroupTest::Welch(_) => Self::TTest,
            GroupTest::Anova(_) => Self::Anova,
        }
    }

    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::TTest => "TTest",
            Self::Anova => "ANOVA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// Regression model tables.
    Model,
    /// Group comparison tables, named by the test that ran.
    Comparison(TestKind),
    /// Other model tables (mediation, factor suitability, correlations).
    Summary,
    /// Other result tables (descriptives, reliability).
    Results,
    Boxplot,
    Histogram,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("model summary"),
            Self::Comparison(kind) => write!(f, "{} results", kind.prefix()),
            Self::Summary => f.write_str("summary"),
            Self::Results => f.write_str("results"),
            Self::Boxplot => f.write_str("boxplot"),
            Self::Histogram => f.write_str("histogram"),
        }
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` so ids are safe path components.
#[must_use]
pub fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "analysis".to_string()
    } else {
        cleaned
    }
}

#[must_use]
pub fn artifact_name(id: &str, artifact: Artifact) -> String {
    let id = sanitize_id(id);
    match artifact {
        Artifact::Model => format!("Model_{id}_Summary.docx"),
        Artifact::Comparison(kind) => format!("{}_Results_{id}.docx", kind.prefix()),
        Artifact::Summary => format!("{id}_Summary.docx"),
        Artifact::Results => format!("{id}_Results.docx"),
        Artifact::Boxplot => format!("{id}_boxplot.svg"),
        Artifact::Histogram => format!("{id}_histogram.svg"),
    }
}

#[must_use]
pub fn artifact_path(dir: &Path, id: &str, artifact: Artifact) -> PathBuf {
    dir.join(artifact_name(id, artifact))
}
