//! Mediation model configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_independent() -> String {
    "ENT".to_string()
}

fn default_mediators() -> [String; 2] {
    ["EO".to_string(), "RP".to_string()]
}

fn default_dependent() -> String {
    "DEPNDT".to_string()
}

const fn default_true() -> bool {
    true
}

/// Default number of bootstrap resamples.
const fn default_bootstrap() -> usize {
    5000
}

const fn default_confidence() -> f64 {
    0.95
}

const fn default_max_iterations() -> usize {
    200
}

const fn default_tolerance() -> f64 {
    1e-8
}

const fn default_max_failed_fraction() -> f64 {
    0.05
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MediationConfig {
    /// Independent variable (X).
    #[serde(default = "default_independent")]
    pub independent: String,

    /// The two parallel mediators (M1, M2).
    #[serde(default = "default_mediators")]
    pub mediators: [String; 2],

    /// Dependent variable (Y).
    #[serde(default = "default_dependent")]
    pub dependent: String,

    /// Estimate the direct path `c`.
    #[serde(default = "default_true")]
    pub include_direct: bool,

    /// Let the mediator residuals covary.
    #[serde(default = "default_true")]
    pub correlate_mediators: bool,

    /// Number of bootstrap resamples.
    #[serde(default = "default_bootstrap")]
    pub bootstrap: usize,

    /// Bootstrap seed. Drawn at random (and reported) when unset.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Confidence level of the percentile intervals.
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Iteration cap for the maximum-likelihood optimizer.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Convergence tolerance on the parameter update.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Largest share of bootstrap resamples allowed to fail before the run is rejected.
    #[serde(default = "default_max_failed_fraction")]
    pub max_failed_fraction: f64,
}

impl Default for MediationConfig {
    fn default() -> Self {
        Self {
            independent: default_independent(),
            mediators: default_mediators(),
            dependent: default_dependent(),
            include_direct: true,
            correlate_mediators: true,
            bootstrap: default_bootstrap(),
            seed: None,
            confidence: default_confidence(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            max_failed_fraction: default_max_failed_fraction(),
        }
    }
}

impl MediationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bootstrap == 0 {
            return Err(ConfigError::invalid(
                "mediation.bootstrap",
                "at least one resample is required",
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigError::invalid(
                "mediation.confidence",
                format!("{} is not in (0, 1)", self.confidence),
            ));
        }
        if !(0.0..1.0).contains(&self.max_failed_fraction) {
            return Err(ConfigError::invalid(
                "mediation.max_failed_fraction",
                format!("{} is not in [0, 1)", self.max_failed_fraction),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(ConfigError::invalid(
                "mediation.tolerance",
                "must be positive",
            ));
        }

        let names = [
            &self.independent,
            &self.mediators[0],
            &self.mediators[1],
            &self.dependent,
        ];
        for (i, a) in names.iter().enumerate() {
            if a.is_empty() {
                return Err(ConfigError::invalid("mediation", "variable names must not be empty"));
            }
            if names[i + 1..].contains(a) {
                return Err(ConfigError::invalid(
                    "mediation",
                    format!("variable '{a}' is used in more than one role"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = MediationConfig::default();
        assert_eq!(config.independent, "ENT");
        assert_eq!(config.mediators, ["EO".to_string(), "RP".to_string()]);
        assert_eq!(config.dependent, "DEPNDT");
        assert_eq!(config.bootstrap, 5000);
        assert!(config.seed.is_none());
        assert!(config.include_direct);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_bootstrap_is_rejected() {
        let config = MediationConfig {
            bootstrap: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mediation.bootstrap"));
    }

    #[test]
    fn confidence_must_be_open_unit_interval() {
        for confidence in [0.0, 1.0, 1.5] {
            let config = MediationConfig {
                confidence,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "confidence {confidence}");
        }
    }

    #[test]
    fn reused_variable_is_rejected() {
        let config = MediationConfig {
            mediators: ["EO".into(), "EO".into()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'EO'"));
    }
}
