//! Nonparametric row bootstrap of the mediation effects.
//!
//! Resample `i` draws its rows from an RNG seeded with a mix of the run seed
//! and `i`, so the draws do not depend on how resamples are scheduled across
//! threads: parallel and sequential runs give identical results.

use plend_core::EffectLabel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::estimate::{EffectValues, fit_moments, sample_covariance};
use super::spec::MediationSpec;
use crate::context::{BootstrapSettings, EstimationSettings};
use crate::error::StatsError;
use crate::math::{quantile_sorted, std_dev};

/// Progress callback receiving the number of finished resamples to add.
pub type Progress<'a> = &'a (dyn Fn(u64) + Sync);

/// SplitMix64 finaliser over `seed + index`.
#[must_use]
pub const fn resample_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Successful bootstrap draws and bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapDraws {
    pub seed: u64,
    pub requested: usize,
    pub failed: usize,
    draws: Vec<EffectValues>,
}

impl BootstrapDraws {
    #[must_use]
    pub fn successful(&self) -> usize {
        self.draws.len()
    }

    /// Draws of one effect, sorted ascending.
    #[must_use]
    pub fn sorted(&self, label: EffectLabel) -> Vec<f64> {
        let mut values: Vec<f64> = self.draws.iter().map(|d| d.get(label)).collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Standard deviation of the draws.
    #[must_use]
    pub fn std_error(&self, label: EffectLabel) -> f64 {
        let values: Vec<f64> = self.draws.iter().map(|d| d.get(label)).collect();
        std_dev(&values)
    }

    /// Percentile interval at `confidence`.
    #[must_use]
    pub fn percentile_interval(&self, label: EffectLabel, confidence: f64) -> (f64, f64) {
        let sorted = self.sorted(label);
        let tail = (1.0 - confidence) / 2.0;
        (
            quantile_sorted(&sorted, tail),
            quantile_sorted(&sorted, 1.0 - tail),
        )
    }
}

fn one_resample(
    rows: &[[f64; 4]],
    spec: &MediationSpec,
    estimation: &EstimationSettings,
    seed: u64,
    index: usize,
) -> Result<EffectValues, StatsError> {
    let mut rng = StdRng::seed_from_u64(resample_seed(seed, index as u64));
    let n = rows.len();
    let sample: Vec<[f64; 4]> = (0..n).map(|_| rows[rng.gen_range(0..n)]).collect();
    let s = sample_covariance(&sample);
    Ok(fit_moments(spec, &s, n, estimation)?.effects())
}

/// Refit the model on `settings.resamples` row resamples.
///
/// Failed refits are dropped and counted. When more than
/// `max_failed_fraction` of the resamples fail the whole bootstrap fails.
pub fn run(
    rows: &[[f64; 4]],
    spec: &MediationSpec,
    estimation: &EstimationSettings,
    settings: &BootstrapSettings,
    seed: u64,
    progress: Option<Progress<'_>>,
) -> Result<BootstrapDraws, StatsError> {
    let requested = settings.resamples;
    let results: Vec<Result<EffectValues, StatsError>> = (0..requested)
        .into_par_iter()
        .map(|index| {
            let result = one_resample(rows, spec, estimation, seed, index);
            if let Some(progress) = progress {
                progress(1);
            }
            result
        })
        .collect();

    let mut draws = Vec::with_capacity(requested);
    let mut failed = 0;
    let mut first_failure = None;
    for result in results {
        match result {
            Ok(values) => draws.push(values),
            Err(err) => {
                failed += 1;
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
    }

    let limit = settings.max_failed_fraction * requested as f64;
    if failed as f64 > limit || draws.len() < 2 {
        return Err(StatsError::NonConvergence {
            stage: "bootstrap",
            iterations: requested,
            detail: format!(
                "{failed} of {requested} resamples failed (limit {:.1}%); first failure: {}",
                settings.max_failed_fraction * 100.0,
                first_failure.map_or_else(|| "none".to_string(), |e| e.to_string())
            ),
        });
    }
    if failed > 0 {
        tracing::warn!(failed, requested, "bootstrap resamples dropped");
    }
    tracing::debug!(seed, successful = draws.len(), "bootstrap finished");

    Ok(BootstrapDraws {
        seed,
        requested,
        failed,
        draws,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use approx::assert_relative_eq;

    use super::*;

    fn rows() -> Vec<[f64; 4]> {
        (0..30)
            .map(|i| {
                let x = f64::from(i % 7) + 0.1 * f64::from(i);
                let m1 = 0.6 * x + f64::from((i * 5) % 3) * 0.4;
                let m2 = 0.3 * x + f64::from((i * 7) % 4) * 0.3;
                let y = 0.2 * x + 0.5 * m1 + 0.4 * m2 + f64::from((i * 11) % 5) * 0.2;
                [x, m1, m2, y]
            })
            .collect()
    }

    fn spec() -> MediationSpec {
        MediationSpec::parallel("X", ["M1", "M2"], "Y").unwrap()
    }

    fn settings(resamples: usize) -> BootstrapSettings {
        BootstrapSettings {
            resamples,
            seed: Some(7),
            confidence: 0.95,
            max_failed_fraction: 0.05,
        }
    }

    #[test]
    fn resample_seeds_differ_by_index() {
        assert_ne!(resample_seed(1, 0), resample_seed(1, 1));
        assert_ne!(resample_seed(1, 0), resample_seed(2, 0));
        assert_eq!(resample_seed(42, 9), resample_seed(42, 9));
    }

    #[test]
    fn same_seed_same_draws() {
        let data = rows();
        let a = run(&data, &spec(), &EstimationSettings::default(), &settings(64), 7, None).unwrap();
        let b = run(&data, &spec(), &EstimationSettings::default(), &settings(64), 7, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.successful(), 64);
    }

    #[test]
    fn parallel_matches_sequential_single_thread_pool() {
        let data = rows();
        let parallel =
            run(&data, &spec(), &EstimationSettings::default(), &settings(40), 11, None).unwrap();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let sequential = pool.install(|| {
            run(&data, &spec(), &EstimationSettings::default(), &settings(40), 11, None).unwrap()
        });
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn progress_counts_every_resample() {
        let counter = AtomicU64::new(0);
        let tick = |n: u64| {
            counter.fetch_add(n, Ordering::Relaxed);
        };
        run(
            &rows(),
            &spec(),
            &EstimationSettings::default(),
            &settings(25),
            3,
            Some(&tick),
        )
        .unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 25);
    }

    #[test]
    fn interval_brackets_the_draws() {
        let draws = run(&rows(), &spec(), &EstimationSettings::default(), &settings(200), 5, None)
            .unwrap();
        let (lo, hi) = draws.percentile_interval(EffectLabel::Ind1, 0.95);
        let sorted = draws.sorted(EffectLabel::Ind1);
        assert!(lo <= hi);
        assert!(lo >= sorted[0] && hi <= sorted[sorted.len() - 1]);
        assert!(draws.std_error(EffectLabel::Ind1) > 0.0);
    }

    #[test]
    fn failing_refits_abort_the_bootstrap() {
        // Restricted model with no iteration budget: every refit fails.
        let restricted = spec().without_direct();
        let estimation = EstimationSettings {
            max_iterations: 0,
            tolerance: 1e-8,
        };
        let err = run(&rows(), &restricted, &estimation, &settings(10), 1, None).unwrap_err();
        let StatsError::NonConvergence {
            stage, iterations, ..
        } = err
        else {
            panic!("expected NonConvergence");
        };
        assert_eq!(stage, "bootstrap");
        assert_eq!(iterations, 10);
    }

    #[test]
    fn total_draws_keep_the_identity() {
        let draws = run(&rows(), &spec(), &EstimationSettings::default(), &settings(20), 9, None)
            .unwrap();
        for d in &draws.draws {
            let expected = d.get(EffectLabel::Direct) + d.get(EffectLabel::Ind1) + d.get(EffectLabel::Ind2);
            assert_relative_eq!(d.get(EffectLabel::Total), expected);
        }
    }
}
