//! Closed enumerations shared across plend crates.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` so the same spelling is used in config files, CLI
//! arguments, JSON output and report tables.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

fn unknown_variant<T: Copy + fmt::Display>(kind: &'static str, value: &str, all: &[T]) -> CoreError {
    CoreError::UnknownVariant {
        kind,
        value: value.to_string(),
        expected: all
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

// ---------------------------------------------------------------------------
// FieldRole
// ---------------------------------------------------------------------------

/// What a column in the respondent table represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Raw survey item (Likert-scale answer).
    Item,
    /// Respondent-level scored variable supplied by the input (ENT, DEPNDT, ...).
    Score,
    /// Demographic field (tenure, education, firm size).
    Demographic,
    /// Row-wise mean over an item group, appended after load.
    Composite,
    /// Column present in the input but not declared by the schema.
    Extra,
}

impl FieldRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Score => "score",
            Self::Demographic => "demographic",
            Self::Composite => "composite",
            Self::Extra => "extra",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ModelNode
// ---------------------------------------------------------------------------

/// Observed variable slot in the parallel two-mediator model.
///
/// ```text
///        a1 ──▶ M1 ── b1
///       /               \
///  X ──┼──────── c ──────┼──▶ Y
///       \               /
///        a2 ──▶ M2 ── b2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelNode {
    Independent,
    FirstMediator,
    SecondMediator,
    Dependent,
}

impl ModelNode {
    pub const ALL: [Self; 4] = [
        Self::Independent,
        Self::FirstMediator,
        Self::SecondMediator,
        Self::Dependent,
    ];

    /// Position of the node in the model covariance matrix.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Independent => 0,
            Self::FirstMediator => 1,
            Self::SecondMediator => 2,
            Self::Dependent => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::FirstMediator => "first_mediator",
            Self::SecondMediator => "second_mediator",
            Self::Dependent => "dependent",
        }
    }
}

impl fmt::Display for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EffectLabel
// ---------------------------------------------------------------------------

/// Every named quantity a fitted mediation model can report.
///
/// Path labels (`c`, `a1`, `a2`, `b1`, `b2`) name free regression
/// coefficients; the remaining labels name defined parameters computed from
/// them (`ind1 := a1*b1`, `ind2 := a2*b2`, `total_indirect := ind1 + ind2`,
/// `total := c + ind1 + ind2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EffectLabel {
    /// Direct path X → Y.
    #[serde(rename = "c")]
    Direct,
    A1,
    A2,
    B1,
    B2,
    Ind1,
    Ind2,
    TotalIndirect,
    Total,
}

impl EffectLabel {
    pub const ALL: [Self; 9] = [
        Self::Direct,
        Self::A1,
        Self::A2,
        Self::B1,
        Self::B2,
        Self::Ind1,
        Self::Ind2,
        Self::TotalIndirect,
        Self::Total,
    ];

    /// Default extraction order for the mediation summary table.
    pub const SUMMARY: [Self; 4] = [Self::Direct, Self::Ind1, Self::Ind2, Self::Total];

    /// Whether the label names a free path coefficient (as opposed to a defined effect).
    #[must_use]
    pub const fn is_path(self) -> bool {
        matches!(
            self,
            Self::Direct | Self::A1 | Self::A2 | Self::B1 | Self::B2
        )
    }

    /// Endpoints `(from, to)` of a path label.
    #[must_use]
    pub const fn endpoints(self) -> Option<(ModelNode, ModelNode)> {
        match self {
            Self::Direct => Some((ModelNode::Independent, ModelNode::Dependent)),
            Self::A1 => Some((ModelNode::Independent, ModelNode::FirstMediator)),
            Self::A2 => Some((ModelNode::Independent, ModelNode::SecondMediator)),
            Self::B1 => Some((ModelNode::FirstMediator, ModelNode::Dependent)),
            Self::B2 => Some((ModelNode::SecondMediator, ModelNode::Dependent)),
            Self::Ind1 | Self::Ind2 | Self::TotalIndirect | Self::Total => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "c",
            Self::A1 => "a1",
            Self::A2 => "a2",
            Self::B1 => "b1",
            Self::B2 => "b2",
            Self::Ind1 => "ind1",
            Self::Ind2 => "ind2",
            Self::TotalIndirect => "total_indirect",
            Self::Total => "total",
        }
    }
}

impl fmt::Display for EffectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        // "direct" is accepted as an alias for the `c` path.
        if wanted == "direct" {
            return Ok(Self::Direct);
        }
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| unknown_variant("effect label", s, &Self::ALL))
    }
}

// ---------------------------------------------------------------------------
// GroupingStrategy
// ---------------------------------------------------------------------------

/// How a column is turned into groups for a t-test / ANOVA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// Use the column's values as factor levels; rejected for continuous columns.
    #[default]
    Factor,
    /// Two groups: at or below the median, above the median.
    MedianSplit,
    /// Four groups cut at the sample quartiles.
    Quartiles,
}

impl GroupingStrategy {
    pub const ALL: [Self; 3] = [Self::Factor, Self::MedianSplit, Self::Quartiles];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Factor => "factor",
            Self::MedianSplit => "median_split",
            Self::Quartiles => "quartiles",
        }
    }
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| unknown_variant("grouping strategy", s, &Self::ALL))
    }
}
