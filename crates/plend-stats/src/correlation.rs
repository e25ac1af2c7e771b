//! Pearson correlation with pairwise-complete observations.
//!
//! Each pair uses every row where both variables are present, independent of
//! missingness in other columns. The resulting matrix need not be positive
//! semi-definite.

use nalgebra::DMatrix;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisContext;
use crate::error::StatsError;
use crate::math::{mean, pairwise_complete, t_two_sided_p};

/// Pearson `r` over rows where both values are present, and the pair count.
/// `r` is NaN below three pairs or when either side is constant.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> (f64, usize) {
    let (x, y) = pairwise_complete(x, y);
    let n = x.len();
    if n < 3 {
        return (f64::NAN, n);
    }
    let (mx, my) = (mean(&x), mean(&y));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(&y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return (f64::NAN, n);
    }
    ((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0), n)
}

/// Two-sided p-value of `H0: rho = 0` via `t = r sqrt((n-2)/(1-r^2))`.
#[must_use]
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if r.is_nan() || n < 3 {
        return f64::NAN;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    t_two_sided_p(r * (df / (1.0 - r * r)).sqrt(), df)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CorrelationMatrix {
    pub variables: Vec<String>,
    pub r: Vec<Vec<f64>>,
    /// Pairwise-complete row counts; the diagonal holds each column's present count.
    pub n: Vec<Vec<usize>>,
    pub p_values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlation of two named variables.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.variables.iter().position(|v| v == a)?;
        let j = self.variables.iter().position(|v| v == b)?;
        Some(self.r[i][j])
    }

    #[must_use]
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let p = self.variables.len();
        DMatrix::from_fn(p, p, |i, j| self.r[i][j])
    }

    /// Smallest pairwise row count off the diagonal.
    #[must_use]
    pub fn min_pairwise_n(&self) -> usize {
        let p = self.variables.len();
        (0..p)
            .flat_map(|i| (0..p).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| self.n[i][j])
            .min()
            .unwrap_or(0)
    }
}

/// Build the matrix from labelled value slices.
pub fn correlation_matrix(columns: &[(&str, &[f64])]) -> Result<CorrelationMatrix, StatsError> {
    if columns.len() < 2 {
        return Err(StatsError::InvalidSpecification(
            "correlation needs at least two variables".into(),
        ));
    }
    let p = columns.len();
    let mut r = vec![vec![1.0; p]; p];
    let mut n = vec![vec![0; p]; p];
    let mut p_values = vec![vec![0.0; p]; p];

    for i in 0..p {
        n[i][i] = columns[i].1.iter().filter(|v| !v.is_nan()).count();
        for j in (i + 1)..p {
            let (rij, nij) = pearson(columns[i].1, columns[j].1);
            if rij.is_nan() {
                tracing::warn!(
                    a = columns[i].0,
                    b = columns[j].0,
                    pairs = nij,
                    "correlation undefined for pair"
                );
            }
            let pij = correlation_p_value(rij, nij);
            r[i][j] = rij;
            r[j][i] = rij;
            n[i][j] = nij;
            n[j][i] = nij;
            p_values[i][j] = pij;
            p_values[j][i] = pij;
        }
    }

    Ok(CorrelationMatrix {
        variables: columns.iter().map(|(name, _)| (*name).to_string()).collect(),
        r,
        n,
        p_values,
    })
}

/// Pairwise-complete Pearson matrix over named columns.
pub fn correlate<S: AsRef<str>>(
    ctx: &AnalysisContext<'_>,
    names: &[S],
) -> Result<CorrelationMatrix, StatsError> {
    let dataset = ctx.dataset();
    let ids = ctx.columns(names)?;
    let columns: Vec<(&str, &[f64])> = ids
        .iter()
        .map(|id| (dataset.name(*id), dataset.values(*id)))
        .collect();
    let matrix = correlation_matrix(&columns)?;
    tracing::info!(variables = matrix.variables.len(), "correlation matrix computed");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn perfect_and_inverse_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).0, 1.0);
        assert_relative_eq!(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).0, -1.0);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).0.is_nan());
    }

    #[test]
    fn symmetric_with_unit_diagonal() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let c = [6.0, 3.0, 5.0, 1.0, 2.0, 4.0];
        let m = correlation_matrix(&[("a", &a), ("b", &b), ("c", &c)]).unwrap();
        for i in 0..3 {
            assert_relative_eq!(m.r[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(m.r[i][j].to_bits(), m.r[j][i].to_bits());
                assert_eq!(m.n[i][j], m.n[j][i]);
            }
        }
    }

    #[test]
    fn pair_is_unaffected_by_missing_values_elsewhere() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let c_full = [6.0, 3.0, 5.0, 1.0, 2.0, 4.0];
        let c_gappy = [f64::NAN, 3.0, f64::NAN, 1.0, 2.0, f64::NAN];

        let full = correlation_matrix(&[("a", &a), ("b", &b), ("c", &c_full)]).unwrap();
        let gappy = correlation_matrix(&[("a", &a), ("b", &b), ("c", &c_gappy)]).unwrap();

        assert_eq!(full.get("a", "b"), gappy.get("a", "b"));
        assert_eq!(gappy.n[0][1], 6);
        assert_eq!(gappy.n[0][2], 3);
        assert_eq!(gappy.min_pairwise_n(), 3);
    }

    #[test]
    fn p_value_reference() {
        // r = 0.5, n = 20 -> t = 2.4495, df = 18, p ~ 0.0247
        assert_relative_eq!(correlation_p_value(0.5, 20), 0.024_7, epsilon = 1e-3);
        assert_relative_eq!(correlation_p_value(1.0, 20), 0.0);
        assert!(correlation_p_value(f64::NAN, 20).is_nan());
    }

    #[test]
    fn single_variable_rejected() {
        assert!(correlation_matrix(&[("a", &[1.0, 2.0, 3.0])]).is_err());
    }
}
