//! Ordinary least squares.

use nalgebra::{DMatrix, DVector};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisContext;
use crate::error::StatsError;
use crate::math::{f_upper_p, mean, t_critical, t_two_sided_p};

/// Name of the intercept term in coefficient tables.
pub const INTERCEPT: &str = "(Intercept)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegressionSummary {
    pub dependent: String,
    /// Rows used after listwise exclusion.
    pub n: usize,
    pub excluded: usize,
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub df_model: usize,
    pub df_residual: usize,
    /// Residual standard error.
    pub sigma: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
}

impl RegressionSummary {
    /// Coefficient row for a term, if present.
    #[must_use]
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term == term)
    }

    /// The first non-intercept coefficient; the slope of a simple regression.
    #[must_use]
    pub fn slope(&self) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term != INTERCEPT)
    }
}

/// Fit `y ~ 1 + predictors` over the rows where every variable is present.
pub fn ols(
    dependent: (&str, &[f64]),
    predictors: &[(&str, &[f64])],
    confidence: f64,
) -> Result<RegressionSummary, StatsError> {
    let (y_name, y_all) = dependent;
    if predictors.is_empty() {
        return Err(StatsError::InvalidSpecification(
            "regression needs at least one predictor".into(),
        ));
    }
    if let Some((name, values)) = predictors.iter().find(|(_, v)| v.len() != y_all.len()) {
        return Err(StatsError::InvalidSpecification(format!(
            "predictor '{name}' has {} values, dependent '{y_name}' has {}",
            values.len(),
            y_all.len()
        )));
    }

    let rows: Vec<usize> = (0..y_all.len())
        .filter(|&r| !y_all[r].is_nan() && predictors.iter().all(|(_, v)| !v[r].is_nan()))
        .collect();
    let n = rows.len();
    let k = predictors.len();
    if n < k + 2 {
        return Err(StatsError::InsufficientData {
            analysis: "ols regression",
            needed: k + 2,
            available: n,
        });
    }
    if rows.len() < y_all.len() {
        tracing::debug!(
            dependent = y_name,
            dropped = y_all.len() - n,
            "listwise exclusion before regression"
        );
    }

    let y = DVector::from_iterator(n, rows.iter().map(|&r| y_all[r]));
    let y_mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    if tss == 0.0 {
        return Err(StatsError::ZeroVariance(y_name.to_string()));
    }
    for (name, values) in predictors {
        let used: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
        let m = mean(&used);
        if used.iter().all(|v| (v - m).abs() == 0.0) {
            return Err(StatsError::ZeroVariance((*name).to_string()));
        }
    }

    let x = DMatrix::from_fn(n, k + 1, |i, j| {
        if j == 0 { 1.0 } else { predictors[j - 1].1[rows[i]] }
    });
    let xt = x.transpose();
    let xtx_inv = (&xt * &x)
        .try_inverse()
        .ok_or_else(|| StatsError::Singular(format!("design matrix for '{y_name}'")))?;
    let beta = &xtx_inv * &xt * &y;
    let residuals = &y - &x * &beta;
    let rss = residuals.norm_squared();

    let df_residual = n - k - 1;
    let sigma2 = rss / df_residual as f64;
    let crit = t_critical(df_residual as f64, confidence);

    let coefficients = (0..=k)
        .map(|j| {
            let estimate = beta[j];
            let std_error = (sigma2 * xtx_inv[(j, j)]).sqrt();
            let t_value = estimate / std_error;
            Coefficient {
                term: if j == 0 {
                    INTERCEPT.to_string()
                } else {
                    predictors[j - 1].0.to_string()
                },
                estimate,
                std_error,
                t_value,
                p_value: t_two_sided_p(t_value, df_residual as f64),
                ci_lower: estimate - crit * std_error,
                ci_upper: estimate + crit * std_error,
            }
        })
        .collect();

    let r_squared = 1.0 - rss / tss;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;
    let f_statistic = (r_squared / k as f64) / ((1.0 - r_squared) / df_residual as f64);

    let nf = n as f64;
    let log_likelihood =
        -nf / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (rss / nf).ln() + 1.0);
    // coefficients plus the residual variance
    let params = (k + 2) as f64;

    let summary = RegressionSummary {
        dependent: y_name.to_string(),
        n,
        excluded: y_all.len() - n,
        coefficients,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value: f_upper_p(f_statistic, k as f64, df_residual as f64),
        df_model: k,
        df_residual,
        sigma: sigma2.sqrt(),
        log_likelihood,
        aic: -2.0 * log_likelihood + 2.0 * params,
        bic: -2.0 * log_likelihood + params * nf.ln(),
    };
    tracing::info!(
        dependent = y_name,
        n,
        r_squared = summary.r_squared,
        "regression fitted"
    );
    Ok(summary)
}

/// Regress `dependent` on the named predictors.
pub fn regress<S: AsRef<str>>(
    ctx: &AnalysisContext<'_>,
    predictors: &[S],
    dependent: &str,
) -> Result<RegressionSummary, StatsError> {
    let dataset = ctx.dataset();
    let y_id = ctx.column(dependent)?;
    let x_ids = ctx.columns(predictors)?;
    let xs: Vec<(&str, &[f64])> = x_ids
        .iter()
        .map(|id| (dataset.name(*id), dataset.values(*id)))
        .collect();
    ols(
        (dataset.name(y_id), dataset.values(y_id)),
        &xs,
        ctx.settings().confidence,
    )
}

/// Single-predictor regression `dependent ~ independent`.
pub fn simple_regression(
    ctx: &AnalysisContext<'_>,
    independent: &str,
    dependent: &str,
) -> Result<RegressionSummary, StatsError> {
    regress(ctx, &[independent], dependent)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use plend_core::{Dataset, FieldRole};

    use super::*;
    use crate::context::AnalysisSettings;

    fn anscombe_one() -> (Vec<f64>, Vec<f64>) {
        (
            vec![10.0, 8.0, 13.0, 9.0, 11.0, 14.0, 6.0, 4.0, 12.0, 7.0, 5.0],
            vec![
                8.04, 6.95, 7.58, 8.81, 8.33, 9.96, 7.24, 4.26, 10.84, 4.82, 5.68,
            ],
        )
    }

    #[test]
    fn anscombe_reference_values() {
        let (x, y) = anscombe_one();
        let fit = ols(("y", &y), &[("x", &x)], 0.95).unwrap();
        let slope = fit.slope().unwrap();
        let intercept = fit.coefficient(INTERCEPT).unwrap();

        assert_eq!(fit.n, 11);
        assert_eq!(fit.df_residual, 9);
        assert_relative_eq!(slope.estimate, 0.500_091, epsilon = 1e-5);
        assert_relative_eq!(intercept.estimate, 3.000_091, epsilon = 1e-5);
        assert_relative_eq!(slope.std_error, 0.117_906, epsilon = 1e-5);
        assert_relative_eq!(fit.r_squared, 0.666_542, epsilon = 1e-5);
        assert_relative_eq!(fit.f_statistic, 17.989_94, epsilon = 1e-3);
        assert!(slope.p_value < 0.01);
        assert!(slope.ci_lower < slope.estimate && slope.estimate < slope.ci_upper);
    }

    #[test]
    fn information_criteria_count_sigma() {
        let (x, y) = anscombe_one();
        let fit = ols(("y", &y), &[("x", &x)], 0.95).unwrap();
        assert_relative_eq!(fit.aic, -2.0 * fit.log_likelihood + 6.0, epsilon = 1e-12);
        assert_relative_eq!(
            fit.bic,
            -2.0 * fit.log_likelihood + 3.0 * 11.0_f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn rows_with_missing_values_are_dropped() {
        let x = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0];
        let y = [2.1, 3.9, 100.0, 8.2, f64::NAN, 12.1];
        let fit = ols(("y", &y), &[("x", &x)], 0.95).unwrap();
        assert_eq!(fit.n, 4);
        assert_eq!(fit.excluded, 2);
    }

    #[test]
    fn constant_predictor_is_rejected() {
        let x = [3.0; 5];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(matches!(
            ols(("y", &y), &[("x", &x)], 0.95),
            Err(StatsError::ZeroVariance(name)) if name == "x"
        ));
    }

    #[test]
    fn too_few_rows() {
        assert!(matches!(
            ols(("y", &[1.0, 2.0]), &[("x", &[1.0, 2.0])], 0.95),
            Err(StatsError::InsufficientData { needed: 3, available: 2, .. })
        ));
    }

    #[test]
    fn two_predictors_recover_exact_plane() {
        let x1 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let x2 = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 9.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(&x2)
            .enumerate()
            .map(|(i, (a, b))| 1.0 + 2.0 * a - 0.5 * b + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let fit = ols(("y", &y), &[("x1", &x1), ("x2", &x2)], 0.95).unwrap();
        assert_relative_eq!(fit.coefficient("x1").unwrap().estimate, 2.0, epsilon = 0.05);
        assert_relative_eq!(fit.coefficient("x2").unwrap().estimate, -0.5, epsilon = 0.05);
        assert_eq!(fit.df_model, 2);
    }

    #[test]
    fn simple_regression_through_context() {
        let (x, y) = anscombe_one();
        let ds = Dataset::from_columns([
            ("ENT", FieldRole::Score, x),
            ("DEPNDT", FieldRole::Score, y),
        ])
        .unwrap();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        let fit = simple_regression(&ctx, "ENT", "DEPNDT").unwrap();
        assert_eq!(fit.dependent, "DEPNDT");
        assert_eq!(fit.slope().unwrap().term, "ENT");
        assert!(simple_regression(&ctx, "EO", "DEPNDT").is_err());
    }
}
