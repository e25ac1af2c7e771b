//! Maximum-likelihood estimation of the path model from a covariance matrix.
//!
//! The model is written in RAM form: `B[to][from]` holds path coefficients,
//! `Psi` holds exogenous and residual (co)variances, and the implied
//! covariance is `Sigma = A Psi A'` with `A = (I - B)^-1`. Start values are
//! per-node least squares on the sample covariance. When they already
//! reproduce it (every exactly identified variant, and noise-free data) the
//! fit is final; otherwise Fisher scoring minimises
//! `F = ln|Sigma| + tr(S Sigma^-1)` with step halving.

use nalgebra::{DMatrix, DVector, Matrix4};
use plend_core::{EffectLabel, ModelNode};

use super::spec::{MediationSpec, Parameter};
use crate::context::EstimationSettings;
use crate::error::StatsError;

pub type Moments = Matrix4<f64>;

const MAX_HALVINGS: usize = 20;

/// Covariance of listwise-complete rows with an `n` divisor.
#[must_use]
pub fn sample_covariance(rows: &[[f64; 4]]) -> Moments {
    let n = rows.len() as f64;
    let mut means = [0.0; 4];
    for row in rows {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= n;
    }
    let mut s = Moments::zeros();
    for row in rows {
        for i in 0..4 {
            for j in 0..=i {
                s[(i, j)] += (row[i] - means[i]) * (row[j] - means[j]);
            }
        }
    }
    for i in 0..4 {
        for j in 0..=i {
            s[(i, j)] /= n;
            s[(j, i)] = s[(i, j)];
        }
    }
    s
}

/// Point values of every effect label, derived from the path matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectValues([f64; 9]);

impl EffectValues {
    #[must_use]
    pub fn from_paths(b: &Moments) -> Self {
        let path = |label: EffectLabel| {
            label
                .endpoints()
                .map_or(0.0, |(from, to)| b[(to.index(), from.index())])
        };
        let c = path(EffectLabel::Direct);
        let ind1 = path(EffectLabel::A1) * path(EffectLabel::B1);
        let ind2 = path(EffectLabel::A2) * path(EffectLabel::B2);
        Self([
            c,
            path(EffectLabel::A1),
            path(EffectLabel::A2),
            path(EffectLabel::B1),
            path(EffectLabel::B2),
            ind1,
            ind2,
            ind1 + ind2,
            c + ind1 + ind2,
        ])
    }

    #[must_use]
    pub const fn get(&self, label: EffectLabel) -> f64 {
        self.0[label as usize]
    }
}

/// Result of one maximum-likelihood fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub theta: Vec<f64>,
    pub paths: Moments,
    pub implied: Moments,
    pub iterations: usize,
    /// `N * F_ML`; zero when the model reproduces the sample covariance.
    pub chi_square: f64,
}

impl Estimate {
    #[must_use]
    pub fn effects(&self) -> EffectValues {
        EffectValues::from_paths(&self.paths)
    }

    /// Fully standardized value of an effect using the implied variances.
    #[must_use]
    pub fn standardized(&self, label: EffectLabel, value: f64) -> f64 {
        let (from, to) = label
            .endpoints()
            .unwrap_or((ModelNode::Independent, ModelNode::Dependent));
        let sd_from = self.implied[(from.index(), from.index())].sqrt();
        let sd_to = self.implied[(to.index(), to.index())].sqrt();
        value * sd_from / sd_to
    }
}

fn unpack(parameters: &[Parameter], theta: &[f64]) -> (Moments, Moments) {
    let mut b = Moments::zeros();
    let mut psi = Moments::zeros();
    for (parameter, value) in parameters.iter().zip(theta) {
        match *parameter {
            Parameter::Path(label) => {
                if let Some((from, to)) = label.endpoints() {
                    b[(to.index(), from.index())] = *value;
                }
            }
            Parameter::Variance(node) => psi[(node.index(), node.index())] = *value,
            Parameter::Covariance(x, y) => {
                psi[(x.index(), y.index())] = *value;
                psi[(y.index(), x.index())] = *value;
            }
        }
    }
    (b, psi)
}

/// `(B, A, Sigma)` for a parameter vector.
fn implied(
    parameters: &[Parameter],
    theta: &[f64],
) -> Result<(Moments, Moments, Moments), StatsError> {
    let (b, psi) = unpack(parameters, theta);
    let a = (Moments::identity() - b)
        .try_inverse()
        .ok_or_else(|| StatsError::Singular("I - B".into()))?;
    let sigma = a * psi * a.transpose();
    Ok((b, a, sigma))
}

fn start_values(
    spec: &MediationSpec,
    parameters: &[Parameter],
    s: &Moments,
) -> Result<Vec<f64>, StatsError> {
    let mut b = Moments::zeros();
    for node in [
        ModelNode::FirstMediator,
        ModelNode::SecondMediator,
        ModelNode::Dependent,
    ] {
        let predictors: Vec<ModelNode> = spec
            .paths()
            .iter()
            .filter_map(|label| label.endpoints())
            .filter(|(_, to)| *to == node)
            .map(|(from, _)| from)
            .collect();
        if predictors.is_empty() {
            continue;
        }
        let k = predictors.len();
        let sxx = DMatrix::from_fn(k, k, |i, j| {
            s[(predictors[i].index(), predictors[j].index())]
        });
        let sxy = DVector::from_fn(k, |i, _| s[(predictors[i].index(), node.index())]);
        let coef = sxx.lu().solve(&sxy).ok_or_else(|| {
            StatsError::Singular(format!(
                "predictor covariance of '{}'",
                spec.node_column(node)
            ))
        })?;
        for (i, from) in predictors.iter().enumerate() {
            b[(node.index(), from.index())] = coef[i];
        }
    }

    let residual = Moments::identity() - b;
    let psi = residual * s * residual.transpose();
    Ok(parameters
        .iter()
        .map(|parameter| match *parameter {
            Parameter::Path(label) => label
                .endpoints()
                .map_or(0.0, |(from, to)| b[(to.index(), from.index())]),
            Parameter::Variance(node) => psi[(node.index(), node.index())],
            Parameter::Covariance(x, y) => psi[(x.index(), y.index())],
        })
        .collect())
}

/// `ln|M|` and `M^-1` for a positive definite matrix.
fn log_det_inverse(m: &Moments) -> Option<(f64, Moments)> {
    let chol = m.cholesky()?;
    let log_det = 2.0 * chol.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
    Some((log_det, chol.inverse()))
}

fn objective(parameters: &[Parameter], theta: &[f64], s: &Moments) -> f64 {
    implied(parameters, theta)
        .ok()
        .and_then(|(_, _, sigma)| log_det_inverse(&sigma))
        .map_or(f64::INFINITY, |(log_det, inv)| log_det + (s * inv).trace())
}

fn derivatives(parameters: &[Parameter], a: &Moments, sigma: &Moments) -> Vec<Moments> {
    parameters
        .iter()
        .map(|parameter| {
            let mut e = Moments::zeros();
            match *parameter {
                Parameter::Path(label) => {
                    if let Some((from, to)) = label.endpoints() {
                        e[(to.index(), from.index())] = 1.0;
                    }
                    let m = a * e * sigma;
                    m + m.transpose()
                }
                Parameter::Variance(node) => {
                    e[(node.index(), node.index())] = 1.0;
                    a * e * a.transpose()
                }
                Parameter::Covariance(x, y) => {
                    e[(x.index(), y.index())] = 1.0;
                    e[(y.index(), x.index())] = 1.0;
                    a * e * a.transpose()
                }
            }
        })
        .collect()
}

/// Fit the model to a sample covariance matrix of `n` rows.
pub fn fit_moments(
    spec: &MediationSpec,
    s: &Moments,
    n: usize,
    settings: &EstimationSettings,
) -> Result<Estimate, StatsError> {
    spec.check_identified()?;
    let parameters = spec.parameters();
    let mut theta = start_values(spec, &parameters, s)?;

    let (b, _, sigma) = implied(&parameters, &theta)?;
    let scale = 1.0 + s.amax();
    if (sigma - s).amax() <= settings.tolerance * scale {
        return Ok(Estimate {
            theta,
            paths: b,
            implied: sigma,
            iterations: 0,
            chi_square: 0.0,
        });
    }

    let (log_det_s, _) = log_det_inverse(s)
        .ok_or_else(|| StatsError::NotPositiveDefinite("sample covariance matrix".into()))?;
    let mut current = objective(&parameters, &theta, s);
    let mut gradient_norm = f64::NAN;

    for iteration in 1..=settings.max_iterations {
        let (_, a, sigma) = implied(&parameters, &theta)?;
        let (_, sigma_inv) = log_det_inverse(&sigma).ok_or_else(|| {
            StatsError::NotPositiveDefinite(format!("implied covariance at iteration {iteration}"))
        })?;
        let d = derivatives(&parameters, &a, &sigma);
        let weight = sigma_inv * (sigma - s) * sigma_inv;
        let scaled: Vec<Moments> = d.iter().map(|dk| sigma_inv * dk).collect();

        let k = parameters.len();
        let gradient = DVector::from_fn(k, |i, _| (weight * d[i]).trace());
        gradient_norm = gradient.amax();
        if gradient_norm < settings.tolerance {
            return finish(&parameters, theta, s, n, current, log_det_s, iteration - 1);
        }
        let information = DMatrix::from_fn(k, k, |i, j| (scaled[i] * scaled[j]).trace());
        let step = information
            .lu()
            .solve(&gradient)
            .ok_or_else(|| StatsError::Singular("expected information matrix".into()))?;

        let mut factor = 1.0;
        let mut accepted = None;
        for _ in 0..=MAX_HALVINGS {
            let candidate: Vec<f64> = theta
                .iter()
                .zip(step.iter())
                .map(|(t, d)| t - factor * d)
                .collect();
            let value = objective(&parameters, &candidate, s);
            if value.is_finite() && value <= current + 1e-12 * (1.0 + current.abs()) {
                accepted = Some((candidate, value));
                break;
            }
            factor /= 2.0;
        }
        let Some((candidate, value)) = accepted else {
            return Err(StatsError::NonConvergence {
                stage: "ml estimation",
                iterations: iteration,
                detail: "step halving failed to decrease the discrepancy".into(),
            });
        };

        let moved = factor * step.amax();
        theta = candidate;
        current = value;
        tracing::trace!(iteration, objective = current, moved, "fisher scoring step");
        if moved < settings.tolerance {
            return finish(&parameters, theta, s, n, current, log_det_s, iteration);
        }
    }

    Err(StatsError::NonConvergence {
        stage: "ml estimation",
        iterations: settings.max_iterations,
        detail: format!("max |gradient| = {gradient_norm:e}"),
    })
}

fn finish(
    parameters: &[Parameter],
    theta: Vec<f64>,
    s: &Moments,
    n: usize,
    objective: f64,
    log_det_s: f64,
    iterations: usize,
) -> Result<Estimate, StatsError> {
    let (b, _, sigma) = implied(parameters, &theta)?;
    let discrepancy = (objective - log_det_s - s.nrows() as f64).max(0.0);
    Ok(Estimate {
        theta,
        paths: b,
        implied: sigma,
        iterations,
        chi_square: n as f64 * discrepancy,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn rows() -> Vec<[f64; 4]> {
        // x, m1, m2, y with mild noise.
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let e1 = [0.3, -0.2, 0.1, -0.4, 0.2, 0.5, -0.3, 0.0, 0.4, -0.1, -0.2, 0.1];
        let e2 = [-0.1, 0.4, -0.3, 0.2, 0.1, -0.5, 0.3, 0.2, -0.2, 0.0, 0.3, -0.4];
        let e3 = [0.2, 0.1, -0.2, 0.3, -0.4, 0.1, 0.0, -0.3, 0.2, 0.4, -0.1, -0.2];
        (0..x.len())
            .map(|i| {
                let m1 = 0.5 * x[i] + e1[i];
                let m2 = -0.3 * x[i] + e2[i];
                let y = 0.2 * x[i] + 0.8 * m1 + 0.6 * m2 + e3[i];
                [x[i], m1, m2, y]
            })
            .collect()
    }

    fn spec() -> MediationSpec {
        MediationSpec::parallel("X", ["M1", "M2"], "Y").unwrap()
    }

    #[test]
    fn saturated_model_reproduces_sample_covariance() {
        let s = sample_covariance(&rows());
        let fit = fit_moments(&spec(), &s, 12, &EstimationSettings::default()).unwrap();
        assert_eq!(fit.iterations, 0);
        assert_relative_eq!(fit.chi_square, 0.0);
        assert!((fit.implied - s).amax() < 1e-10);
    }

    #[test]
    fn restricted_model_iterates_to_stationary_point() {
        let s = sample_covariance(&rows());
        let restricted = spec().without_direct().without_mediator_covariance();
        let fit = fit_moments(&restricted, &s, 12, &EstimationSettings::default()).unwrap();
        assert!(fit.iterations > 0);
        assert!(fit.chi_square > 0.0);
        assert_relative_eq!(fit.effects().get(EffectLabel::Direct), 0.0);
    }

    #[test]
    fn zero_iteration_budget_fails_on_restricted_model() {
        let s = sample_covariance(&rows());
        let restricted = spec().without_direct();
        let settings = EstimationSettings {
            max_iterations: 0,
            tolerance: 1e-8,
        };
        let err = fit_moments(&restricted, &s, 12, &settings).unwrap_err();
        assert!(matches!(
            err,
            StatsError::NonConvergence { stage: "ml estimation", iterations: 0, .. }
        ));
    }

    #[test]
    fn total_is_direct_plus_indirect() {
        let s = sample_covariance(&rows());
        let fit = fit_moments(&spec(), &s, 12, &EstimationSettings::default()).unwrap();
        let e = fit.effects();
        let expected = e.get(EffectLabel::Direct) + e.get(EffectLabel::Ind1) + e.get(EffectLabel::Ind2);
        assert_eq!(e.get(EffectLabel::Total).to_bits(), expected.to_bits());
        assert_eq!(
            e.get(EffectLabel::Ind1).to_bits(),
            (e.get(EffectLabel::A1) * e.get(EffectLabel::B1)).to_bits()
        );
    }

    #[test]
    fn sample_covariance_uses_n_divisor() {
        let s = sample_covariance(&[[1.0, 0.0, 0.0, 0.0], [3.0, 0.0, 0.0, 0.0]]);
        assert_relative_eq!(s[(0, 0)], 1.0);
    }
}
