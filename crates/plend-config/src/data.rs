//! Input table configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    "data/survey.csv".to_string()
}

fn default_missing_tokens() -> Vec<String> {
    ["", "NA", "NaN", "."].iter().map(ToString::to_string).collect()
}

fn default_required() -> Vec<String> {
    vec!["ENT".to_string(), "DEPNDT".to_string()]
}

fn default_optional() -> Vec<String> {
    vec!["BIZDEG".to_string()]
}

fn default_demographics() -> Vec<String> {
    ["tenure", "education", "firm_size"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataConfig {
    /// CSV export of the cleaned survey.
    #[serde(default = "default_path")]
    pub path: String,

    /// Cell spellings treated as missing.
    #[serde(default = "default_missing_tokens")]
    pub missing_tokens: Vec<String>,

    /// Scored variables that must be present in the input.
    #[serde(default = "default_required")]
    pub required: Vec<String>,

    /// Scored variables used when present (e.g. `BIZDEG`).
    #[serde(default = "default_optional")]
    pub optional: Vec<String>,

    /// Demographic fields used when present.
    #[serde(default = "default_demographics")]
    pub demographics: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            missing_tokens: default_missing_tokens(),
            required: default_required(),
            optional: default_optional(),
            demographics: default_demographics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = DataConfig::default();
        assert_eq!(config.path, "data/survey.csv");
        assert!(config.missing_tokens.iter().any(String::is_empty));
        assert_eq!(config.required, vec!["ENT", "DEPNDT"]);
        assert_eq!(config.demographics.len(), 3);
    }
}
