//! Descriptive statistics per column.

use plend_core::{ColumnId, FieldRole};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisContext;
use crate::math::{mean, quantile_sorted, sorted_present, std_dev};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Descriptive {
    pub variable: String,
    pub role: FieldRole,
    pub n: usize,
    pub missing: usize,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Moment skewness `m3 / m2^1.5`.
    pub skewness: f64,
    /// Moment excess kurtosis `m4 / m2^2 - 3`.
    pub kurtosis: f64,
}

/// Summarize one column over its present values.
#[must_use]
pub fn describe_values(variable: &str, role: FieldRole, values: &[f64]) -> Descriptive {
    let sorted = sorted_present(values);
    let n = sorted.len();
    let m = mean(&sorted);

    let central = |k: i32| sorted.iter().map(|v| (v - m).powi(k)).sum::<f64>() / n as f64;
    let (skewness, kurtosis) = if n < 2 {
        (f64::NAN, f64::NAN)
    } else {
        let m2 = central(2);
        if m2 == 0.0 {
            (f64::NAN, f64::NAN)
        } else {
            (central(3) / m2.powf(1.5), central(4) / (m2 * m2) - 3.0)
        }
    };

    Descriptive {
        variable: variable.to_string(),
        role,
        n,
        missing: values.len() - n,
        mean: m,
        sd: std_dev(&sorted),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
        skewness,
        kurtosis,
    }
}

/// Describe the given columns, or every non-item column when `ids` is empty.
#[must_use]
pub fn describe(ctx: &AnalysisContext<'_>, ids: &[ColumnId]) -> Vec<Descriptive> {
    let dataset = ctx.dataset();
    let selected: Vec<ColumnId> = if ids.is_empty() {
        dataset
            .ids()
            .filter(|id| !matches!(dataset.role(*id), FieldRole::Item | FieldRole::Extra))
            .collect()
    } else {
        ids.to_vec()
    };

    let rows: Vec<Descriptive> = selected
        .iter()
        .map(|id| describe_values(dataset.name(*id), dataset.role(*id), dataset.values(*id)))
        .collect();
    tracing::info!(variables = rows.len(), "descriptive statistics computed");
    rows
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use plend_core::Dataset;

    use super::*;
    use crate::context::AnalysisSettings;

    #[test]
    fn describes_present_values_only() {
        let d = describe_values(
            "DEPNDT",
            FieldRole::Score,
            &[1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0],
        );
        assert_eq!(d.n, 5);
        assert_eq!(d.missing, 1);
        assert_relative_eq!(d.mean, 3.0);
        assert_relative_eq!(d.sd, 2.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(d.median, 3.0);
        assert_relative_eq!(d.q1, 2.0);
        assert_relative_eq!(d.q3, 4.0);
        assert_relative_eq!(d.skewness, 0.0, epsilon = 1e-12);
        assert_relative_eq!(d.kurtosis, -1.3, epsilon = 1e-12);
    }

    #[test]
    fn right_skewed_values_have_positive_skewness() {
        let d = describe_values("x", FieldRole::Score, &[1.0, 1.0, 1.0, 2.0, 10.0]);
        assert!(d.skewness > 0.0);
    }

    #[test]
    fn empty_and_constant_columns_do_not_panic() {
        let empty = describe_values("x", FieldRole::Score, &[f64::NAN, f64::NAN]);
        assert_eq!(empty.n, 0);
        assert!(empty.mean.is_nan());
        assert!(empty.min.is_nan());

        let constant = describe_values("x", FieldRole::Score, &[2.0, 2.0, 2.0]);
        assert_relative_eq!(constant.sd, 0.0);
        assert!(constant.skewness.is_nan());
    }

    #[test]
    fn default_selection_skips_items() {
        let ds = Dataset::from_columns([
            ("EO1", FieldRole::Item, vec![1.0, 2.0]),
            ("ENT", FieldRole::Score, vec![1.0, 2.0]),
            ("EO", FieldRole::Composite, vec![1.0, 2.0]),
        ])
        .unwrap();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        let names: Vec<String> = describe(&ctx, &[]).into_iter().map(|d| d.variable).collect();
        assert_eq!(names, vec!["ENT", "EO"]);
    }
}
