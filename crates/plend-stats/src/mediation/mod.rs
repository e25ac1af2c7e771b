//! Parallel two-mediator model `X -> {M1, M2} -> Y` with a direct path.
//!
//! All paths are estimated together by maximum likelihood on the
//! listwise-complete covariance matrix. Indirect effects are products of
//! their `a` and `b` paths, and the total effect is `c + ind1 + ind2`.
//! Standard errors and percentile intervals come from a nonparametric row
//! bootstrap that is reproducible for a fixed seed.

pub mod bootstrap;
pub mod effects;
pub mod estimate;
pub mod spec;

pub use bootstrap::{BootstrapDraws, Progress, resample_seed};
pub use effects::{EffectRow, FittedMediation, MediationSummary, assign_display_names, wald};
pub use estimate::{EffectValues, Estimate, Moments, fit_moments, sample_covariance};
pub use spec::{MediationSpec, OBSERVED_MOMENTS, Parameter};

use crate::context::AnalysisContext;
use crate::error::StatsError;

/// Fewest complete rows accepted for a fit.
pub const MIN_ROWS: usize = 5;

/// Fit the model and bootstrap its effects.
pub fn fit_mediation(
    ctx: &AnalysisContext<'_>,
    spec: &MediationSpec,
) -> Result<FittedMediation, StatsError> {
    fit_mediation_with_progress(ctx, spec, None)
}

/// [`fit_mediation`] reporting each finished bootstrap resample to `progress`.
pub fn fit_mediation_with_progress(
    ctx: &AnalysisContext<'_>,
    spec: &MediationSpec,
    progress: Option<Progress<'_>>,
) -> Result<FittedMediation, StatsError> {
    spec.check_identified()?;
    let dataset = ctx.dataset();
    let ids = ctx.columns(&spec.columns())?;
    let complete = dataset.complete_rows(&ids);
    if complete.len() < MIN_ROWS {
        return Err(StatsError::InsufficientData {
            analysis: "mediation",
            needed: MIN_ROWS,
            available: complete.len(),
        });
    }
    let excluded = dataset.n_rows() - complete.len();
    if excluded > 0 {
        tracing::debug!(excluded, "listwise exclusion before mediation");
    }

    let rows: Vec<[f64; 4]> = complete
        .iter()
        .map(|&r| std::array::from_fn(|k| dataset.values(ids[k])[r]))
        .collect();
    let settings = ctx.settings();
    let s = sample_covariance(&rows);
    let point = fit_moments(spec, &s, rows.len(), &settings.estimation)?;
    tracing::debug!(
        iterations = point.iterations,
        chi_square = point.chi_square,
        "point estimates fitted"
    );

    let seed = settings.bootstrap.seed.unwrap_or_else(rand::random);
    if settings.bootstrap.seed.is_none() {
        tracing::info!(seed, "no bootstrap seed configured, drew one at random");
    }
    let draws = bootstrap::run(
        &rows,
        spec,
        &settings.estimation,
        &settings.bootstrap,
        seed,
        progress,
    )?;

    let fitted = FittedMediation::new(
        spec.clone(),
        &point,
        &draws,
        rows.len(),
        excluded,
        settings.bootstrap.confidence,
    );
    tracing::info!(
        n = fitted.n(),
        seed,
        resamples = settings.bootstrap.resamples,
        failed = fitted.failed_resamples(),
        "mediation model fitted"
    );
    Ok(fitted)
}
