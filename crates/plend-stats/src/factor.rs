//! Factor-analysis suitability: Kaiser-Meyer-Olkin sampling adequacy and
//! Bartlett's test of sphericity.
//!
//! Both diagnostics read a correlation matrix and never modify it.

use std::fmt;

use nalgebra::DMatrix;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisContext;
use crate::correlation::correlate;
use crate::error::StatsError;
use crate::math::chi2_upper_p;

// ---------------------------------------------------------------------------
// KmoBand
// ---------------------------------------------------------------------------

/// Kaiser's verbal rating of a KMO value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KmoBand {
    Marvelous,
    Meritorious,
    Middling,
    Mediocre,
    Miserable,
    Unacceptable,
}

impl KmoBand {
    #[must_use]
    pub fn from_kmo(kmo: f64) -> Self {
        match kmo {
            k if k >= 0.9 => Self::Marvelous,
            k if k >= 0.8 => Self::Meritorious,
            k if k >= 0.7 => Self::Middling,
            k if k >= 0.6 => Self::Mediocre,
            k if k >= 0.5 => Self::Miserable,
            _ => Self::Unacceptable,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marvelous => "marvelous",
            Self::Meritorious => "meritorious",
            Self::Middling => "middling",
            Self::Mediocre => "mediocre",
            Self::Miserable => "miserable",
            Self::Unacceptable => "unacceptable",
        }
    }

    /// Values below 0.5 indicate the variables are unsuitable for factoring.
    #[must_use]
    pub const fn is_adequate(self) -> bool {
        !matches!(self, Self::Unacceptable)
    }
}

impl fmt::Display for KmoBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableMsa {
    pub variable: String,
    pub msa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BartlettTest {
    pub chi_square: f64,
    pub df: usize,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FactorSuitability {
    pub variables: Vec<String>,
    /// Sample size used for Bartlett's test.
    pub n: usize,
    pub kmo: f64,
    pub band: KmoBand,
    pub msa: Vec<VariableMsa>,
    pub bartlett: BartlettTest,
}

fn check_matrix(r: &DMatrix<f64>) -> Result<usize, StatsError> {
    let p = r.nrows();
    if p != r.ncols() || p < 2 {
        return Err(StatsError::InvalidSpecification(format!(
            "expected a square correlation matrix of at least 2 variables, got {}x{}",
            r.nrows(),
            r.ncols()
        )));
    }
    if r.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::InvalidSpecification(
            "correlation matrix has undefined entries".into(),
        ));
    }
    Ok(p)
}

/// Overall KMO and the per-variable MSA values.
pub fn kmo(r: &DMatrix<f64>) -> Result<(f64, Vec<f64>), StatsError> {
    let p = check_matrix(r)?;
    // Pairwise-complete matrices can be indefinite; partials are undefined then.
    let inv = r
        .clone()
        .cholesky()
        .ok_or_else(|| {
            StatsError::NotPositiveDefinite("correlation matrix for KMO".into())
        })?
        .inverse();

    let mut r2_rows = vec![0.0; p];
    let mut q2_rows = vec![0.0; p];
    for i in 0..p {
        for j in 0..p {
            if i == j {
                continue;
            }
            let partial = -inv[(i, j)] / (inv[(i, i)] * inv[(j, j)]).sqrt();
            r2_rows[i] += r[(i, j)].powi(2);
            q2_rows[i] += partial.powi(2);
        }
    }

    let ratio = |r2: f64, q2: f64| if r2 + q2 == 0.0 { 0.0 } else { r2 / (r2 + q2) };
    let msa = r2_rows
        .iter()
        .zip(&q2_rows)
        .map(|(r2, q2)| ratio(*r2, *q2))
        .collect();
    let overall = ratio(r2_rows.iter().sum(), q2_rows.iter().sum());
    Ok((overall, msa))
}

/// Bartlett's sphericity test; `H0`: the correlation matrix is the identity.
pub fn bartlett(r: &DMatrix<f64>, n: usize) -> Result<BartlettTest, StatsError> {
    let p = check_matrix(r)?;
    let multiplier = n as f64 - 1.0 - (2.0 * p as f64 + 5.0) / 6.0;
    if multiplier <= 0.0 {
        return Err(StatsError::InsufficientData {
            analysis: "bartlett sphericity",
            needed: (2 * p + 5).div_ceil(6) + 2,
            available: n,
        });
    }
    let det = r.determinant();
    if det <= 0.0 {
        return Err(StatsError::NotPositiveDefinite(format!(
            "correlation matrix determinant is {det:e}"
        )));
    }

    let chi_square = -multiplier * det.ln();
    let df = p * (p - 1) / 2;
    Ok(BartlettTest {
        chi_square,
        df,
        p_value: chi2_upper_p(chi_square, df as f64),
    })
}

/// KMO and Bartlett over the named variables' pairwise correlation matrix.
///
/// Bartlett's `n` is the smallest pairwise-complete count in the matrix.
pub fn assess<S: AsRef<str>>(
    ctx: &AnalysisContext<'_>,
    names: &[S],
) -> Result<FactorSuitability, StatsError> {
    let matrix = correlate(ctx, names)?;
    let r = matrix.to_matrix();
    let n = matrix.min_pairwise_n();

    let (overall, msa) = kmo(&r)?;
    let sphericity = bartlett(&r, n)?;
    let band = KmoBand::from_kmo(overall);
    if !band.is_adequate() {
        tracing::warn!(kmo = overall, "sampling adequacy below 0.5");
    }
    tracing::info!(
        kmo = overall,
        chi_square = sphericity.chi_square,
        p_value = sphericity.p_value,
        "factor suitability assessed"
    );

    Ok(FactorSuitability {
        msa: matrix
            .variables
            .iter()
            .zip(msa)
            .map(|(variable, msa)| VariableMsa {
                variable: variable.clone(),
                msa,
            })
            .collect(),
        variables: matrix.variables,
        n,
        kmo: overall,
        band,
        bartlett: sphericity,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use plend_core::{Dataset, FieldRole};
    use rstest::rstest;

    use super::*;
    use crate::context::AnalysisSettings;

    fn equicorrelated(p: usize, rho: f64) -> DMatrix<f64> {
        DMatrix::from_fn(p, p, |i, j| if i == j { 1.0 } else { rho })
    }

    #[test]
    fn identity_has_chi_square_zero() {
        let test = bartlett(&DMatrix::identity(4, 4), 100).unwrap();
        assert_relative_eq!(test.chi_square, 0.0, epsilon = 1e-12);
        assert_eq!(test.df, 6);
        assert_relative_eq!(test.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn bartlett_reference_value() {
        let r = equicorrelated(3, 0.5);
        let test = bartlett(&r, 50).unwrap();
        // det = 1 - 3(0.25) + 2(0.125) = 0.5 ; multiplier = 49 - 11/6
        let expected = -(49.0 - 11.0 / 6.0) * 0.5_f64.ln();
        assert_relative_eq!(test.chi_square, expected, epsilon = 1e-10);
        assert!(test.p_value < 1e-6);
    }

    #[test]
    fn equicorrelated_msa_is_uniform() {
        let (overall, msa) = kmo(&equicorrelated(4, 0.6)).unwrap();
        for value in &msa {
            assert_relative_eq!(*value, overall, epsilon = 1e-12);
        }
    }

    #[rstest]
    #[case(0.1)]
    #[case(0.5)]
    #[case(0.9)]
    #[case(-0.2)]
    fn kmo_and_p_value_are_bounded(#[case] rho: f64) {
        let r = equicorrelated(5, rho);
        let (overall, msa) = kmo(&r).unwrap();
        assert!((0.0..=1.0).contains(&overall));
        assert!(msa.iter().all(|m| (0.0..=1.0).contains(m)));
        let test = bartlett(&r, 40).unwrap();
        assert!((0.0..=1.0).contains(&test.p_value));
    }

    #[test]
    fn singular_matrix_is_reported() {
        let r = equicorrelated(3, 1.0);
        assert!(matches!(kmo(&r), Err(StatsError::NotPositiveDefinite(_))));
        assert!(matches!(bartlett(&r, 30), Err(StatsError::NotPositiveDefinite(_))));
    }

    #[test]
    fn indefinite_pairwise_matrix_is_rejected_by_kmo() {
        // Symmetric with unit diagonal but det < 0, as pairwise deletion can produce.
        let r = DMatrix::from_row_slice(3, 3, &[
            1.0, 0.9, 0.9, //
            0.9, 1.0, -0.9, //
            0.9, -0.9, 1.0,
        ]);
        assert!(r.determinant() < 0.0);
        let err = kmo(&r).unwrap_err();
        assert!(matches!(err, StatsError::NotPositiveDefinite(_)), "{err:?}");
    }

    #[rstest]
    #[case(0.95, KmoBand::Marvelous)]
    #[case(0.72, KmoBand::Middling)]
    #[case(0.5, KmoBand::Miserable)]
    #[case(0.31, KmoBand::Unacceptable)]
    fn kaiser_bands(#[case] value: f64, #[case] band: KmoBand) {
        assert_eq!(KmoBand::from_kmo(value), band);
    }

    #[test]
    fn assess_leaves_dataset_untouched() {
        let ds = Dataset::from_columns([
            ("EO", FieldRole::Composite, vec![3.1, 2.4, 4.0, 3.6, 2.2, 4.4, 3.0, 3.9]),
            ("RP", FieldRole::Composite, vec![2.9, 2.0, 3.8, 3.1, 2.5, 4.1, 2.7, 3.3]),
            ("ENT", FieldRole::Score, vec![3.5, 2.1, 4.2, 3.3, 2.0, 4.7, 2.9, 3.4]),
            ("DEPNDT", FieldRole::Score, vec![3.0, 2.6, 4.1, 3.9, 2.1, 4.0, 3.2, 3.0]),
        ])
        .unwrap();
        let before = ds.clone();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        let result = assess(&ctx, &["EO", "RP", "ENT", "DEPNDT"]).unwrap();
        assert_eq!(ds, before);
        assert_eq!(result.n, 8);
        assert_eq!(result.msa.len(), 4);
        assert_eq!(result.bartlett.df, 6);
        assert!((0.0..=1.0).contains(&result.kmo));
    }
}
