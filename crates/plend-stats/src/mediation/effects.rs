//! Fitted mediation model and effect extraction.

use std::collections::BTreeMap;

use plend_core::EffectLabel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::bootstrap::BootstrapDraws;
use super::estimate::Estimate;
use super::spec::MediationSpec;
use crate::error::StatsError;
use crate::math::{chi2_upper_p, normal_two_sided_p};

/// One reported effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EffectRow {
    pub label: EffectLabel,
    /// Display name; the raw label unless a summary table assigned one.
    pub name: String,
    pub estimate: f64,
    /// Standard deviation of the bootstrap draws.
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
    /// Percentile bootstrap interval.
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Fully standardized estimate.
    pub std_all: f64,
}

/// `(z, p)` for an estimate and its bootstrap standard error.
///
/// A zero standard error yields an infinite `z` and `p = 0`, or `z = 0` and
/// `p = 1` when the estimate is itself zero.
#[must_use]
pub fn wald(estimate: f64, std_error: f64) -> (f64, f64) {
    if std_error == 0.0 {
        return if estimate == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY.copysign(estimate), 0.0)
        };
    }
    let z = estimate / std_error;
    (z, normal_two_sided_p(z))
}

/// Give `rows` the display `names` in order when the counts match;
/// otherwise keep the raw labels so no row is named after another effect.
pub fn assign_display_names(rows: &mut [EffectRow], names: &[String]) {
    if rows.len() == names.len() {
        for (row, name) in rows.iter_mut().zip(names) {
            row.name.clone_from(name);
        }
    } else {
        tracing::warn!(
            rows = rows.len(),
            expected = names.len(),
            "effect count does not match display names; using raw labels"
        );
        for row in rows {
            row.name = row.label.as_str().to_string();
        }
    }
}

/// Serializable summary of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MediationSummary {
    pub independent: String,
    pub mediators: [String; 2],
    pub dependent: String,
    /// Listwise-complete rows used for fitting.
    pub n: usize,
    pub excluded: usize,
    pub seed: u64,
    pub resamples: usize,
    pub failed_resamples: usize,
    pub confidence: f64,
    pub iterations: usize,
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    /// Model fit p-value; absent for saturated models.
    pub fit_p_value: Option<f64>,
    pub effects: Vec<EffectRow>,
}

/// A fitted parallel mediation model: one row per available effect label.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedMediation {
    spec: MediationSpec,
    n: usize,
    excluded: usize,
    seed: u64,
    resamples: usize,
    failed_resamples: usize,
    confidence: f64,
    iterations: usize,
    chi_square: f64,
    rows: BTreeMap<EffectLabel, EffectRow>,
}

impl FittedMediation {
    pub(crate) fn new(
        spec: MediationSpec,
        point: &Estimate,
        draws: &BootstrapDraws,
        n: usize,
        excluded: usize,
        confidence: f64,
    ) -> Self {
        let values = point.effects();
        let labels = spec.paths().iter().copied().chain([
            EffectLabel::Ind1,
            EffectLabel::Ind2,
            EffectLabel::TotalIndirect,
            EffectLabel::Total,
        ]);
        let rows = labels
            .map(|label| {
                let estimate = values.get(label);
                let std_error = draws.std_error(label);
                let (z_value, p_value) = wald(estimate, std_error);
                let (ci_lower, ci_upper) = draws.percentile_interval(label, confidence);
                let row = EffectRow {
                    label,
                    name: label.as_str().to_string(),
                    estimate,
                    std_error,
                    z_value,
                    p_value,
                    ci_lower,
                    ci_upper,
                    std_all: point.standardized(label, estimate),
                };
                (label, row)
            })
            .collect();

        Self {
            spec,
            n,
            excluded,
            seed: draws.seed,
            resamples: draws.requested,
            failed_resamples: draws.failed,
            confidence,
            iterations: point.iterations,
            chi_square: point.chi_square,
            rows,
        }
    }

    #[must_use]
    pub const fn spec(&self) -> &MediationSpec {
        &self.spec
    }

    #[must_use]
    pub const fn n(&self) -> usize {
        self.n
    }

    /// Seed the bootstrap actually used.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn failed_resamples(&self) -> usize {
        self.failed_resamples
    }

    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    #[must_use]
    pub const fn chi_square(&self) -> f64 {
        self.chi_square
    }

    #[must_use]
    pub fn degrees_of_freedom(&self) -> usize {
        usize::try_from(self.spec.degrees_of_freedom()).unwrap_or(0)
    }

    /// Labels present in this model, in canonical order.
    #[must_use]
    pub fn available(&self) -> Vec<EffectLabel> {
        self.rows.keys().copied().collect()
    }

    pub fn get(&self, label: EffectLabel) -> Result<&EffectRow, StatsError> {
        self.rows.get(&label).ok_or_else(|| StatsError::LabelNotFound {
            label,
            available: self.available(),
        })
    }

    /// One row per requested label, in request order. Any unknown label
    /// fails the whole extraction.
    pub fn extract(&self, labels: &[EffectLabel]) -> Result<Vec<EffectRow>, StatsError> {
        labels
            .iter()
            .map(|label| self.get(*label).cloned())
            .collect()
    }

    /// Direct, per-mediator indirect and total effects with display names.
    #[must_use]
    pub fn summary_table(&self) -> Vec<EffectRow> {
        let [m1, m2] = self.spec.mediators();
        let groups = [
            (vec![EffectLabel::Direct], vec!["Direct effect".to_string()]),
            (
                vec![EffectLabel::Ind1, EffectLabel::Ind2],
                vec![format!("Indirect via {m1}"), format!("Indirect via {m2}")],
            ),
            (vec![EffectLabel::Total], vec!["Total effect".to_string()]),
        ];

        let mut table = Vec::new();
        for (labels, names) in groups {
            let mut rows: Vec<EffectRow> = labels
                .iter()
                .filter_map(|label| self.rows.get(label).cloned())
                .collect();
            if rows.is_empty() {
                continue;
            }
            assign_display_names(&mut rows, &names);
            table.extend(rows);
        }
        table
    }

    #[must_use]
    pub fn summary(&self) -> MediationSummary {
        let df = self.degrees_of_freedom();
        MediationSummary {
            independent: self.spec.independent().to_string(),
            mediators: self.spec.mediators().clone(),
            dependent: self.spec.dependent().to_string(),
            n: self.n,
            excluded: self.excluded,
            seed: self.seed,
            resamples: self.resamples,
            failed_resamples: self.failed_resamples,
            confidence: self.confidence,
            iterations: self.iterations,
            chi_square: self.chi_square,
            degrees_of_freedom: df,
            fit_p_value: (df > 0).then(|| chi2_upper_p(self.chi_square, df as f64)),
            effects: self.rows.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn row(label: EffectLabel) -> EffectRow {
        EffectRow {
            label,
            name: label.as_str().to_string(),
            estimate: 0.1,
            std_error: 0.05,
            z_value: 2.0,
            p_value: 0.045,
            ci_lower: 0.01,
            ci_upper: 0.2,
            std_all: 0.08,
        }
    }

    #[test]
    fn names_assigned_in_order_when_arity_matches() {
        let mut rows = vec![row(EffectLabel::Ind1), row(EffectLabel::Ind2)];
        assign_display_names(
            &mut rows,
            &["Indirect via EO".to_string(), "Indirect via RP".to_string()],
        );
        assert_eq!(rows[0].name, "Indirect via EO");
        assert_eq!(rows[1].name, "Indirect via RP");
    }

    #[test]
    fn raw_labels_kept_when_arity_differs() {
        let mut rows = vec![
            row(EffectLabel::Ind1),
            row(EffectLabel::Ind2),
            row(EffectLabel::TotalIndirect),
        ];
        assign_display_names(
            &mut rows,
            &["Indirect via EO".to_string(), "Indirect via RP".to_string()],
        );
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ind1", "ind2", "total_indirect"]);
    }

    #[test]
    fn wald_handles_degenerate_standard_errors() {
        assert_eq!(wald(0.0, 0.0), (0.0, 1.0));
        let (z, p) = wald(-0.3, 0.0);
        assert!(z.is_infinite() && z < 0.0);
        assert_eq!(p, 0.0);
        let (z, p) = wald(0.4, 0.2);
        assert!((z - 2.0).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn effect_row_schema_validates_serialized_row() {
        let schema = serde_json::to_value(schemars::schema_for!(EffectRow)).unwrap();
        let value = serde_json::to_value(row(EffectLabel::Direct)).unwrap();
        let validator = jsonschema::validator_for(&schema).expect("valid schema");
        assert!(validator.is_valid(&value));
        assert_eq!(value["label"], "c");
    }
}
