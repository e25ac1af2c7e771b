//! Structural specification of the parallel two-mediator model.

use std::collections::HashSet;

use plend_config::MediationConfig;
use plend_core::{EffectLabel, ModelNode};

use crate::error::StatsError;

/// Distinct observed moments for four variables: `4 * 5 / 2`.
pub const OBSERVED_MOMENTS: usize = 10;

/// A free parameter of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Regression coefficient of a labelled path.
    Path(EffectLabel),
    /// Variance of the independent variable, residual variance otherwise.
    Variance(ModelNode),
    /// Residual covariance between two nodes.
    Covariance(ModelNode, ModelNode),
}

/// Which paths and residual covariances the model estimates, and the column
/// bound to each node.
#[derive(Debug, Clone, PartialEq)]
pub struct MediationSpec {
    independent: String,
    mediators: [String; 2],
    dependent: String,
    paths: Vec<EffectLabel>,
    covariances: Vec<(ModelNode, ModelNode)>,
}

fn ordered(a: ModelNode, b: ModelNode) -> (ModelNode, ModelNode) {
    if a <= b { (a, b) } else { (b, a) }
}

impl MediationSpec {
    /// Build a spec from an explicit path list.
    ///
    /// Every label must be a path label used at most once. The four indirect
    /// paths `a1`, `a2`, `b1`, `b2` are mandatory; `c` is optional.
    pub fn new(
        independent: &str,
        mediators: [&str; 2],
        dependent: &str,
        paths: &[EffectLabel],
    ) -> Result<Self, StatsError> {
        let mut seen = HashSet::new();
        for label in paths {
            if !label.is_path() {
                return Err(StatsError::InvalidSpecification(format!(
                    "'{label}' is a defined effect, not a path"
                )));
            }
            if !seen.insert(*label) {
                return Err(StatsError::DuplicateLabel(*label));
            }
        }
        for required in [EffectLabel::A1, EffectLabel::A2, EffectLabel::B1, EffectLabel::B2] {
            if !seen.contains(&required) {
                return Err(StatsError::InvalidSpecification(format!(
                    "path '{required}' is required by the parallel mediation model"
                )));
            }
        }

        let names = [independent, mediators[0], mediators[1], dependent];
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(StatsError::InvalidSpecification(format!(
                    "no column bound to {}",
                    ModelNode::ALL[i]
                )));
            }
            if names[..i].contains(name) {
                return Err(StatsError::InvalidSpecification(format!(
                    "column '{name}' is bound to more than one model node"
                )));
            }
        }

        let mut ordered_paths: Vec<EffectLabel> = paths.to_vec();
        ordered_paths.sort();
        Ok(Self {
            independent: independent.to_string(),
            mediators: [mediators[0].to_string(), mediators[1].to_string()],
            dependent: dependent.to_string(),
            paths: ordered_paths,
            covariances: vec![(ModelNode::FirstMediator, ModelNode::SecondMediator)],
        })
    }

    /// The full model: direct path, both mediated paths and correlated
    /// mediator residuals. Exactly identified.
    pub fn parallel(
        independent: &str,
        mediators: [&str; 2],
        dependent: &str,
    ) -> Result<Self, StatsError> {
        Self::new(
            independent,
            mediators,
            dependent,
            &[
                EffectLabel::Direct,
                EffectLabel::A1,
                EffectLabel::A2,
                EffectLabel::B1,
                EffectLabel::B2,
            ],
        )
    }

    pub fn from_config(config: &MediationConfig) -> Result<Self, StatsError> {
        let mut spec = Self::parallel(
            &config.independent,
            [&config.mediators[0], &config.mediators[1]],
            &config.dependent,
        )?;
        if !config.include_direct {
            spec = spec.without_direct();
        }
        if !config.correlate_mediators {
            spec = spec.without_mediator_covariance();
        }
        Ok(spec)
    }

    /// Fix `c` at zero (full mediation).
    #[must_use]
    pub fn without_direct(mut self) -> Self {
        self.paths.retain(|p| *p != EffectLabel::Direct);
        self
    }

    /// Fix the mediator residual covariance at zero.
    #[must_use]
    pub fn without_mediator_covariance(mut self) -> Self {
        self.covariances
            .retain(|c| *c != (ModelNode::FirstMediator, ModelNode::SecondMediator));
        self
    }

    /// Free an additional residual covariance.
    pub fn with_residual_covariance(
        mut self,
        a: ModelNode,
        b: ModelNode,
    ) -> Result<Self, StatsError> {
        if a == b {
            return Err(StatsError::InvalidSpecification(format!(
                "a residual covariance needs two distinct nodes, got {a} twice"
            )));
        }
        let pair = ordered(a, b);
        if self.covariances.contains(&pair) {
            return Err(StatsError::InvalidSpecification(format!(
                "residual covariance {}~~{} is already free",
                self.node_column(pair.0),
                self.node_column(pair.1)
            )));
        }
        self.covariances.push(pair);
        Ok(self)
    }

    #[must_use]
    pub fn independent(&self) -> &str {
        &self.independent
    }

    #[must_use]
    pub const fn mediators(&self) -> &[String; 2] {
        &self.mediators
    }

    #[must_use]
    pub fn dependent(&self) -> &str {
        &self.dependent
    }

    /// Estimated path labels in canonical order.
    #[must_use]
    pub fn paths(&self) -> &[EffectLabel] {
        &self.paths
    }

    #[must_use]
    pub fn has_path(&self, label: EffectLabel) -> bool {
        self.paths.contains(&label)
    }

    /// Column bound to a node.
    #[must_use]
    pub fn node_column(&self, node: ModelNode) -> &str {
        match node {
            ModelNode::Independent => &self.independent,
            ModelNode::FirstMediator => &self.mediators[0],
            ModelNode::SecondMediator => &self.mediators[1],
            ModelNode::Dependent => &self.dependent,
        }
    }

    /// Columns in node order X, M1, M2, Y.
    #[must_use]
    pub fn columns(&self) -> [&str; 4] {
        ModelNode::ALL.map(|node| self.node_column(node))
    }

    /// Free parameters: paths, then variances, then covariances.
    #[must_use]
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = self.paths.iter().copied().map(Parameter::Path).collect();
        params.extend(ModelNode::ALL.into_iter().map(Parameter::Variance));
        params.extend(
            self.covariances
                .iter()
                .map(|(a, b)| Parameter::Covariance(*a, *b)),
        );
        params
    }

    /// Readable name of a parameter, e.g. `a1` or `EO~~RP`.
    #[must_use]
    pub fn parameter_name(&self, parameter: Parameter) -> String {
        match parameter {
            Parameter::Path(label) => label.as_str().to_string(),
            Parameter::Variance(node) => {
                let col = self.node_column(node);
                format!("{col}~~{col}")
            }
            Parameter::Covariance(a, b) => {
                format!("{}~~{}", self.node_column(a), self.node_column(b))
            }
        }
    }

    /// Model degrees of freedom; negative when under-identified.
    #[must_use]
    pub fn degrees_of_freedom(&self) -> isize {
        OBSERVED_MOMENTS as isize - self.parameters().len() as isize
    }

    /// Reject models with more free parameters than observed moments.
    pub fn check_identified(&self) -> Result<(), StatsError> {
        let params = self.parameters();
        if params.len() > OBSERVED_MOMENTS {
            return Err(StatsError::NotIdentified {
                free_parameters: params.len(),
                moments: OBSERVED_MOMENTS,
                parameters: params.iter().map(|p| self.parameter_name(*p)).collect(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn full() -> MediationSpec {
        MediationSpec::parallel("ENT", ["EO", "RP"], "DEPNDT").unwrap()
    }

    #[test]
    fn parallel_model_is_saturated() {
        let spec = full();
        assert_eq!(spec.parameters().len(), 10);
        assert_eq!(spec.degrees_of_freedom(), 0);
        assert!(spec.check_identified().is_ok());
        assert_eq!(spec.columns(), ["ENT", "EO", "RP", "DEPNDT"]);
    }

    #[test]
    fn restricted_models_gain_degrees_of_freedom() {
        let spec = full().without_direct().without_mediator_covariance();
        assert_eq!(spec.degrees_of_freedom(), 2);
        assert!(!spec.has_path(EffectLabel::Direct));
    }

    #[test]
    fn extra_covariance_is_not_identified() {
        let spec = full()
            .with_residual_covariance(ModelNode::FirstMediator, ModelNode::Dependent)
            .unwrap();
        let err = spec.check_identified().unwrap_err();
        let StatsError::NotIdentified {
            free_parameters,
            moments,
            parameters,
        } = err
        else {
            panic!("expected NotIdentified");
        };
        assert_eq!(free_parameters, 11);
        assert_eq!(moments, 10);
        assert!(parameters.contains(&"EO~~DEPNDT".to_string()));
        assert!(parameters.contains(&"c".to_string()));
    }

    #[test]
    fn duplicate_path_label_rejected() {
        let err = MediationSpec::new(
            "ENT",
            ["EO", "RP"],
            "DEPNDT",
            &[
                EffectLabel::A1,
                EffectLabel::A2,
                EffectLabel::B1,
                EffectLabel::B2,
                EffectLabel::A1,
            ],
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::DuplicateLabel(EffectLabel::A1)));
    }

    #[test]
    fn defined_effect_is_not_a_path() {
        let err = MediationSpec::new(
            "ENT",
            ["EO", "RP"],
            "DEPNDT",
            &[EffectLabel::Ind1, EffectLabel::A1],
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::InvalidSpecification(_)));
    }

    #[test]
    fn node_columns_must_be_distinct() {
        assert!(MediationSpec::parallel("ENT", ["EO", "EO"], "DEPNDT").is_err());
        assert!(MediationSpec::parallel("ENT", ["EO", "RP"], " ").is_err());
    }

    #[test]
    fn repeated_covariance_rejected() {
        assert!(
            full()
                .with_residual_covariance(ModelNode::SecondMediator, ModelNode::FirstMediator)
                .is_err()
        );
    }

    #[test]
    fn from_config_respects_switches() {
        let config = MediationConfig {
            include_direct: false,
            correlate_mediators: false,
            ..MediationConfig::default()
        };
        let spec = MediationSpec::from_config(&config).unwrap();
        assert_eq!(
            spec.paths(),
            &[EffectLabel::A1, EffectLabel::A2, EffectLabel::B1, EffectLabel::B2]
        );
        assert_eq!(spec.parameters().len(), 8);
    }
}
