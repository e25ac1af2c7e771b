//! Small numeric helpers shared by the analyses.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Arithmetic mean; NaN for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with an `n - 1` divisor; NaN below two values.
#[must_use]
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Sample quantile using linear interpolation between order statistics
/// (Hyndman & Fan type 7). `sorted` must be ascending and NaN-free.
#[must_use]
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = h.ceil() as usize;
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

/// Copy of the non-missing values, sorted ascending.
#[must_use]
pub fn sorted_present(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Rows where both values are present.
#[must_use]
pub fn pairwise_complete(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip()
}

/// Two-sided p-value of a standard normal statistic.
#[must_use]
pub fn normal_two_sided_p(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    Normal::new(0.0, 1.0).map_or(f64::NAN, |dist| (2.0 * dist.sf(z.abs())).clamp(0.0, 1.0))
}

/// Two-sided p-value of a Student t statistic.
#[must_use]
pub fn t_two_sided_p(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |dist| (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Critical value `t` with `P(|T| <= t) = confidence`.
#[must_use]
pub fn t_critical(df: f64, confidence: f64) -> f64 {
    StudentsT::new(0.0, 1.0, df)
        .map_or(f64::NAN, |dist| dist.inverse_cdf(0.5 + confidence / 2.0))
}

/// Upper-tail p-value of an F statistic.
#[must_use]
pub fn f_upper_p(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() {
        return f64::NAN;
    }
    if f.is_infinite() {
        return 0.0;
    }
    FisherSnedecor::new(df1, df2).map_or(f64::NAN, |dist| dist.sf(f).clamp(0.0, 1.0))
}

/// Upper-tail p-value of a chi-square statistic.
#[must_use]
pub fn chi2_upper_p(x: f64, df: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    ChiSquared::new(df).map_or(f64::NAN, |dist| dist.sf(x.max(0.0)).clamp(0.0, 1.0))
}
