//! Explicit analysis context.
//!
//! Every analysis receives the respondent table and the run settings through
//! an [`AnalysisContext`] instead of reaching for shared globals. The table
//! is borrowed immutably: composites must be appended before a context is
//! created, and nothing an analysis does can modify the data.

use plend_config::PlendConfig;
use plend_core::{ColumnId, Dataset};

use crate::error::StatsError;

/// Bootstrap resampling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapSettings {
    pub resamples: usize,
    /// Fixed seed for reproducible runs; `None` draws one from entropy.
    pub seed: Option<u64>,
    pub confidence: f64,
    pub max_failed_fraction: f64,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            resamples: 5000,
            seed: None,
            confidence: 0.95,
            max_failed_fraction: 0.05,
        }
    }
}

/// Maximum-likelihood optimizer limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimationSettings {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub bootstrap: BootstrapSettings,
    pub estimation: EstimationSettings,
    /// Largest number of distinct levels accepted for a factor grouping.
    pub max_levels: usize,
    /// Confidence level of regression coefficient intervals.
    pub confidence: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            bootstrap: BootstrapSettings::default(),
            estimation: EstimationSettings::default(),
            max_levels: 10,
            confidence: 0.95,
        }
    }
}

impl AnalysisSettings {
    #[must_use]
    pub fn from_config(config: &PlendConfig) -> Self {
        let mediation = &config.mediation;
        Self {
            bootstrap: BootstrapSettings {
                resamples: mediation.bootstrap,
                seed: mediation.seed,
                confidence: mediation.confidence,
                max_failed_fraction: mediation.max_failed_fraction,
            },
            estimation: EstimationSettings {
                max_iterations: mediation.max_iterations,
                tolerance: mediation.tolerance,
            },
            max_levels: config.grouping.max_levels,
            confidence: config.regression.confidence,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.bootstrap.seed = seed;
        }
        self
    }

    #[must_use]
    pub const fn with_resamples(mut self, resamples: usize) -> Self {
        self.bootstrap.resamples = resamples;
        self
    }
}

/// The dataset plus settings, passed to every analysis function.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    dataset: &'a Dataset,
    settings: AnalysisSettings,
}

impl<'a> AnalysisContext<'a> {
    #[must_use]
    pub const fn new(dataset: &'a Dataset, settings: AnalysisSettings) -> Self {
        Self { dataset, settings }
    }

    #[must_use]
    pub const fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    #[must_use]
    pub const fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn column(&self, name: &str) -> Result<ColumnId, StatsError> {
        Ok(self.dataset.column_id(name)?)
    }

    pub fn columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<ColumnId>, StatsError> {
        Ok(self.dataset.column_ids(names)?)
    }
}

#[cfg(test)]
mod tests {
    use plend_core::FieldRole;

    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = PlendConfig::default();
        config.mediation.bootstrap = 250;
        config.regression.confidence = 0.9;
        config.mediation.seed = Some(11);
        config.grouping.max_levels = 4;

        let settings = AnalysisSettings::from_config(&config);
        assert_eq!(settings.bootstrap.resamples, 250);
        assert_eq!(settings.bootstrap.seed, Some(11));
        assert_eq!(settings.max_levels, 4);
        assert_eq!(settings.estimation.max_iterations, 200);
        assert!((settings.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn seed_override_only_replaces_when_given() {
        let settings = AnalysisSettings::default().with_seed(Some(3));
        assert_eq!(settings.bootstrap.seed, Some(3));
        assert_eq!(settings.with_seed(None).bootstrap.seed, Some(3));
    }

    #[test]
    fn column_lookup_surfaces_core_error() {
        let ds = Dataset::from_columns([("ENT", FieldRole::Score, vec![1.0])]).unwrap();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        assert!(ctx.column("ENT").is_ok());
        assert!(matches!(ctx.column("EO"), Err(StatsError::Core(_))));
    }
}
