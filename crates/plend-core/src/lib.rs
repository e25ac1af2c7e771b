//! # plend-core
//!
//! Foundational types shared across all plend crates:
//! - Declared survey schema checked once at load time
//! - The in-memory respondent table (`Dataset`) with a uniform missing-value model
//! - Composite score builder (row-wise means over item groups)
//! - Closed enumerations for field roles, model nodes, effect labels and grouping strategies
//! - Cross-cutting error types

pub mod composite;
pub mod dataset;
pub mod enums;
pub mod errors;
pub mod schema;

pub use composite::{CompositeGroup, CompositeSummary, build_composites, row_mean};
pub use dataset::{ColumnId, Dataset, MissingTokens};
pub use enums::{EffectLabel, FieldRole, GroupingStrategy, ModelNode};
pub use errors::CoreError;
pub use schema::{FieldSpec, SurveySchema};
