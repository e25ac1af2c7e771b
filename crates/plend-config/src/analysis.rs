//! Settings for the hypothesis tests and the factor-suitability check.

use plend_core::GroupingStrategy;
use serde::{Deserialize, Serialize};

fn default_factor_variables() -> Vec<String> {
    ["EO", "RP", "ENT", "BIZDEG", "DEPNDT"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_max_levels() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FactorConfig {
    /// Variables entering the KMO / Bartlett check.
    #[serde(default = "default_factor_variables")]
    pub variables: Vec<String>,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            variables: default_factor_variables(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupingConfig {
    /// A `factor` grouping column may have at most this many distinct levels.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
        }
    }
}

const fn default_regression_confidence() -> f64 {
    0.95
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegressionConfig {
    /// Coverage of the coefficient confidence intervals.
    #[serde(default = "default_regression_confidence")]
    pub confidence: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            confidence: default_regression_confidence(),
        }
    }
}

/// A simple regression run by the pipeline (`Model_<id>_Summary`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HypothesisConfig {
    pub id: String,
    pub independent: String,
    pub dependent: String,
}

impl HypothesisConfig {
    #[must_use]
    pub fn new(id: &str, independent: &str, dependent: &str) -> Self {
        Self {
            id: id.to_string(),
            independent: independent.to_string(),
            dependent: dependent.to_string(),
        }
    }
}

/// A group comparison run by the pipeline (`TTest_Results_<id>` for two groups,
/// `ANOVA_Results_<id>` for more).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ComparisonConfig {
    pub id: String,
    /// Column that defines the groups.
    pub group: String,
    /// Column compared across groups.
    pub value: String,
    #[serde(default)]
    pub grouping: GroupingStrategy,
}

pub(crate) fn default_hypotheses() -> Vec<HypothesisConfig> {
    vec![
        HypothesisConfig::new("H1A", "ENT", "DEPNDT"),
        HypothesisConfig::new("H1B", "EO", "DEPNDT"),
        HypothesisConfig::new("H1C", "RP", "DEPNDT"),
    ]
}

pub(crate) fn default_comparisons() -> Vec<ComparisonConfig> {
    vec![
        ComparisonConfig {
            id: "EO".to_string(),
            group: "EO".to_string(),
            value: "DEPNDT".to_string(),
            grouping: GroupingStrategy::MedianSplit,
        },
        ComparisonConfig {
            id: "RP".to_string(),
            group: "RP".to_string(),
            value: "DEPNDT".to_string(),
            grouping: GroupingStrategy::Quartiles,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(FactorConfig::default().variables.len(), 5);
        assert_eq!(GroupingConfig::default().max_levels, 10);
        assert!((RegressionConfig::default().confidence - 0.95).abs() < 1e-12);
        assert_eq!(default_hypotheses()[0], HypothesisConfig::new("H1A", "ENT", "DEPNDT"));
        assert!(
            default_comparisons()
                .iter()
                .all(|c| c.grouping != GroupingStrategy::Factor)
        );
    }

    #[test]
    fn comparison_grouping_defaults_to_factor() {
        let parsed: ComparisonConfig =
            serde_json::from_str(r#"{"id":"X","group":"education","value":"DEPNDT"}"#).unwrap();
        assert_eq!(parsed.grouping, GroupingStrategy::Factor);
    }
}
