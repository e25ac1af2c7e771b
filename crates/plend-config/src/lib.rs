//! # plend-config
//!
//! Layered configuration loading for plend using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PLEND_*` prefix, `__` as separator)
//! 2. An explicit file passed with `--config`
//! 3. Project-level `.plend/config.toml`
//! 4. User-level `~/.config/plend/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `PLEND_MEDIATION__BOOTSTRAP` -> `mediation.bootstrap`,
//! `PLEND_REPORT__OUTPUT_DIR` -> `report.output_dir`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use plend_config::PlendConfig;
//!
//! let config = PlendConfig::load_with_dotenv(None).expect("config");
//! println!("bootstrap resamples: {}", config.mediation.bootstrap);
//! ```

mod analysis;
mod data;
mod error;
mod mediation;
mod report;

pub use analysis::{
    ComparisonConfig, FactorConfig, GroupingConfig, HypothesisConfig, RegressionConfig,
};
pub use data::DataConfig;
pub use error::ConfigError;
pub use mediation::MediationConfig;
pub use report::ReportConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use plend_core::{CompositeGroup, MissingTokens, SurveySchema};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_composites() -> Vec<CompositeGroup> {
    vec![
        CompositeGroup::numbered("EO", "EO", 10),
        CompositeGroup::numbered("RP", "RP", 6),
    ]
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlendConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default = "default_composites")]
    pub composites: Vec<CompositeGroup>,
    #[serde(default)]
    pub mediation: MediationConfig,
    #[serde(default)]
    pub factor: FactorConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub regression: RegressionConfig,
    #[serde(default = "analysis::default_hypotheses")]
    pub hypotheses: Vec<HypothesisConfig>,
    #[serde(default = "analysis::default_comparisons")]
    pub comparisons: Vec<ComparisonConfig>,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for PlendConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            composites: default_composites(),
            mediation: MediationConfig::default(),
            factor: FactorConfig::default(),
            grouping: GroupingConfig::default(),
            regression: RegressionConfig::default(),
            hypotheses: analysis::default_hypotheses(),
            comparisons: analysis::default_comparisons(),
            report: ReportConfig::default(),
        }
    }
}

impl PlendConfig {
    /// Load configuration from all sources and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory (if any), then [`Self::load`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".plend/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("PLEND_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("plend").join("config.toml"))
    }

    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mediation.validate()?;

        for (i, group) in self.composites.iter().enumerate() {
            if group.items.is_empty() {
                return Err(ConfigError::invalid(
                    &format!("composites.{}", group.name),
                    "item list is empty",
                ));
            }
            if self.composites[i + 1..].iter().any(|g| g.name == group.name) {
                return Err(ConfigError::invalid(
                    "composites",
                    format!("composite '{}' is defined twice", group.name),
                ));
            }
        }

        if self.factor.variables.len() < 2 {
            return Err(ConfigError::invalid(
                "factor.variables",
                "at least two variables are required",
            ));
        }
        if !(self.regression.confidence > 0.0 && self.regression.confidence < 1.0) {
            return Err(ConfigError::invalid(
                "regression.confidence",
                format!("{} is not in (0, 1)", self.regression.confidence),
            ));
        }
        if self.grouping.max_levels < 2 {
            return Err(ConfigError::invalid(
                "grouping.max_levels",
                "must allow at least two levels",
            ));
        }
        Ok(())
    }

    /// Every column an analysis section reads, paired with its config field.
    #[must_use]
    pub fn analysis_columns(&self) -> Vec<(String, &str)> {
        let mediation = &self.mediation;
        let mut columns = vec![
            ("mediation.independent".to_string(), mediation.independent.as_str()),
            ("mediation.mediators".to_string(), mediation.mediators[0].as_str()),
            ("mediation.mediators".to_string(), mediation.mediators[1].as_str()),
            ("mediation.dependent".to_string(), mediation.dependent.as_str()),
        ];
        columns.extend(
            self.factor
                .variables
                .iter()
                .map(|name| ("factor.variables".to_string(), name.as_str())),
        );
        for hypothesis in &self.hypotheses {
            let field = format!("hypotheses.{}", hypothesis.id);
            columns.push((format!("{field}.independent"), hypothesis.independent.as_str()));
            columns.push((format!("{field}.dependent"), hypothesis.dependent.as_str()));
        }
        for comparison in &self.comparisons {
            let field = format!("comparisons.{}", comparison.id);
            columns.push((format!("{field}.group"), comparison.group.as_str()));
            columns.push((format!("{field}.value"), comparison.value.as_str()));
        }
        columns
    }

    /// Match the analysis sections against the columns actually loaded.
    ///
    /// Optional scores absent from the table are removed from
    /// `factor.variables` and returned. Any other absent column fails here,
    /// before an analysis has run.
    pub fn reconcile_columns(
        &mut self,
        present: impl Fn(&str) -> bool,
    ) -> Result<Vec<String>, ConfigError> {
        let optional = &self.data.optional;
        let (kept, dropped): (Vec<String>, Vec<String>) = self
            .factor
            .variables
            .drain(..)
            .partition(|name| present(name) || !optional.contains(name));
        self.factor.variables = kept;

        if self.factor.variables.len() < 2 {
            return Err(ConfigError::invalid(
                "factor.variables",
                format!(
                    "fewer than two variables remain after dropping absent optional columns {dropped:?}"
                ),
            ));
        }
        if let Some((field, name)) = self
            .analysis_columns()
            .into_iter()
            .find(|(_, name)| !present(name))
        {
            return Err(ConfigError::invalid(
                &field,
                format!("column '{name}' is not in the survey data"),
            ));
        }
        Ok(dropped)
    }

    /// Declared input schema: required scores, optional scores, demographics
    /// and every composite item.
    #[must_use]
    pub fn survey_schema(&self) -> SurveySchema {
        let schema = self
            .data
            .required
            .iter()
            .fold(SurveySchema::new(), |schema, name| schema.score(name));
        let schema = self
            .data
            .optional
            .iter()
            .fold(schema, |schema, name| schema.optional_score(name));
        let schema = self
            .data
            .demographics
            .iter()
            .fold(schema, |schema, name| schema.demographic(name));
        self.composites.iter().fold(schema, SurveySchema::item_group)
    }

    #[must_use]
    pub fn missing_tokens(&self) -> MissingTokens {
        MissingTokens::new(&self.data.missing_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PlendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.composites.len(), 2);
        assert_eq!(config.composites[0].items.len(), 10);
        assert_eq!(config.composites[1].items.len(), 6);
    }

    #[test]
    fn absent_optional_factor_variable_is_dropped() {
        let mut config = PlendConfig::default();
        let loaded = ["ENT", "DEPNDT", "EO", "RP"];
        let dropped = config
            .reconcile_columns(|name| loaded.contains(&name))
            .unwrap();
        assert_eq!(dropped, vec!["BIZDEG"]);
        assert_eq!(config.factor.variables, vec!["EO", "RP", "ENT", "DEPNDT"]);
    }

    #[test]
    fn absent_hypothesis_column_fails_before_analysis() {
        let mut config = PlendConfig::default();
        config.hypotheses.push(HypothesisConfig::new("H3", "tenure", "DEPNDT"));
        let loaded = ["ENT", "DEPNDT", "EO", "RP", "BIZDEG"];
        let err = config
            .reconcile_columns(|name| loaded.contains(&name))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("hypotheses.H3.independent"), "{message}");
        assert!(message.contains("'tenure'"), "{message}");
    }

    #[test]
    fn absent_required_factor_variable_is_not_dropped() {
        let mut config = PlendConfig::default();
        let loaded = ["ENT", "EO", "RP", "BIZDEG"];
        let err = config
            .reconcile_columns(|name| loaded.contains(&name))
            .unwrap_err();
        assert!(err.to_string().contains("DEPNDT"));
    }

    #[test]
    fn regression_confidence_must_be_a_probability() {
        let mut config = PlendConfig::default();
        config.regression.confidence = 1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("regression.confidence"));
    }

    #[test]
    fn figment_builds_without_files() {
        let config: PlendConfig = PlendConfig::figment(None)
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.mediation.bootstrap, 5000);
        assert_eq!(config.report.decimals, 3);
    }

    #[test]
    fn survey_schema_declares_items_and_scores() {
        let schema = PlendConfig::default().survey_schema();
        assert!(schema.get("ENT").is_some_and(|f| f.required));
        assert!(schema.get("BIZDEG").is_some_and(|f| !f.required));
        assert!(schema.get("EO10").is_some_and(|f| f.required));
        assert!(schema.get("RP6").is_some());
        assert!(schema.get("RP7").is_none());
    }

    #[test]
    fn duplicate_composite_is_rejected() {
        let mut config = PlendConfig::default();
        config.composites.push(CompositeGroup::new("EO", &["X1"]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }
}
