//! Analysis error types.

use plend_core::{CoreError, EffectLabel};

fn join_labels(labels: &[EffectLabel]) -> String {
    labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by the analyses. Missing data is never one of them:
/// incomplete rows are excluded pairwise or listwise instead.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// Column lookup or dataset error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Too few usable observations after excluding missing values.
    #[error("{analysis}: needs at least {needed} complete observations, found {available}")]
    InsufficientData {
        analysis: &'static str,
        needed: usize,
        available: usize,
    },

    /// A variable is constant over the usable rows.
    #[error("Variable '{0}' has zero variance over the usable rows")]
    ZeroVariance(String),

    /// A matrix that must be inverted is singular.
    #[error("Singular matrix: {0}")]
    Singular(String),

    /// A matrix that must be positive definite is not.
    #[error("Matrix is not positive definite: {0}")]
    NotPositiveDefinite(String),

    /// A continuous column was passed as a factor.
    #[error(
        "Column '{column}' cannot be used as a grouping factor: {distinct_levels} distinct values \
         (maximum {max_levels}, integer-valued); choose median_split or quartiles grouping instead"
    )]
    GroupingNotCategorical {
        column: String,
        distinct_levels: usize,
        max_levels: usize,
    },

    /// Fewer than two non-empty groups after grouping.
    #[error("Column '{column}' yields {groups} non-empty group(s); at least two are required")]
    TooFewGroups { column: String, groups: usize },

    /// Structural model has more free parameters than observed moments.
    #[error(
        "Model is not identified: {free_parameters} free parameters but only {moments} observed moments \
         (parameters: {})",
        .parameters.join(", ")
    )]
    NotIdentified {
        free_parameters: usize,
        moments: usize,
        parameters: Vec<String>,
    },

    /// The same path label was specified twice.
    #[error("Path label '{0}' is used more than once in the model specification")]
    DuplicateLabel(EffectLabel),

    /// The model specification is malformed in some other way.
    #[error("Invalid model specification: {0}")]
    InvalidSpecification(String),

    /// Optimization or bootstrap did not stabilize within the configured limits.
    #[error("{stage} did not converge after {iterations} iteration(s): {detail}")]
    NonConvergence {
        stage: &'static str,
        iterations: usize,
        detail: String,
    },

    /// A requested effect label is not part of the fitted model.
    #[error("Effect label '{label}' does not exist in the fitted model (available: {})", join_labels(.available))]
    LabelNotFound {
        label: EffectLabel,
        available: Vec<EffectLabel>,
    },
}
