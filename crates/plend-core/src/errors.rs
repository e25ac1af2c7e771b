//! Cross-cutting error types for plend.
//!
//! Errors raised while loading, validating or extending the respondent table.
//! Analysis errors (`StatsError`) and report errors (`ReportError`) live in
//! their own crates; the binary converges everything into `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A field declared as required by the schema is absent from the input header.
    #[error("Schema validation failed: required column '{column}' is missing from the input")]
    MissingColumn { column: String },

    /// A cell in a declared numeric column could not be parsed.
    #[error("Schema validation failed: column '{column}' row {row} has non-numeric value '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// Column lookup by name failed after load.
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// Attempted to add a column whose name is already taken.
    #[error("Column '{0}' already exists in the dataset")]
    DuplicateColumn(String),

    /// A new column does not have one value per respondent.
    #[error("Column '{column}' has {actual} values but the dataset has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Composite definition is unusable (empty item list, unknown label, ...).
    #[error("Invalid composite '{name}': {reason}")]
    InvalidComposite { name: String, reason: String },

    /// A string did not match any member of a closed enumeration.
    #[error("Unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: String,
    },

    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while opening the input file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
