use anyhow::Context;
use plend_report::{Artifact, ReportTable};
use plend_stats::{
    AnalysisContext, EffectRow, FittedMediation, MediationSpec, MediationSummary,
    fit_mediation_with_progress,
};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::MediateArgs;
use crate::commands::shared::export_table;
use crate::context::AppContext;
use crate::output;
use crate::progress::BootstrapProgress;

#[derive(Debug, Serialize)]
pub struct MediationReport {
    pub summary: MediationSummary,
    /// Rows selected for reporting, with display names.
    pub table: Vec<EffectRow>,
}

/// Fit the configured model with a bootstrap progress bar.
pub fn fit_configured(ctx: &AppContext, resamples: Option<usize>) -> anyhow::Result<FittedMediation> {
    let spec = MediationSpec::from_config(&ctx.config.mediation)
        .context("invalid mediation model in configuration")?;
    let mut settings = ctx.settings;
    if let Some(resamples) = resamples {
        settings = settings.with_resamples(resamples);
    }
    let analysis = AnalysisContext::new(&ctx.dataset, settings);

    let progress = BootstrapProgress::start(settings.bootstrap.resamples, "bootstrap");
    let tick = |finished: u64| progress.advance(finished);
    match fit_mediation_with_progress(&analysis, &spec, Some(&tick)) {
        Ok(fitted) => {
            progress.done();
            Ok(fitted)
        }
        Err(error) => {
            progress.failed();
            Err(error).context("mediation model failed")
        }
    }
}

pub fn mediation_table(
    id: &str,
    fitted: &FittedMediation,
    rows: &[EffectRow],
    decimals: usize,
) -> ReportTable {
    let spec = fitted.spec();
    let [m1, m2] = spec.mediators();
    let heading = format!(
        "{id}: {} -> {m1}, {m2} -> {} (parallel mediation)",
        spec.independent(),
        spec.dependent()
    );
    ReportTable::from_mediation(heading, &fitted.summary(), rows, decimals)
}

/// Handle `plend mediate`.
pub fn handle(args: &MediateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let fitted = fit_configured(ctx, args.resamples)?;
    let rows = if args.effects.is_empty() {
        fitted.summary_table()
    } else {
        fitted
            .extract(&args.effects)
            .context("effect extraction failed")?
    };

    let table = mediation_table(&args.id, &fitted, &rows, ctx.decimals());
    export_table(ctx, flags, &args.id, Artifact::Summary, &table)?;
    let report = MediationReport {
        summary: fitted.summary(),
        table: rows,
    };
    output::emit(&report, &table, flags.format)
}
