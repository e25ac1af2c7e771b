//! `plend run`: every configured analysis, exported to the output directory.

use std::path::PathBuf;

use anyhow::Context;
use plend_report::{Artifact, ReportTable, TestKind};
use plend_stats::{assess, correlate, describe, simple_regression};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::commands::compare::run_comparison;
use crate::commands::composites::{composite_reports, reliability_table};
use crate::commands::mediate::{fit_configured, mediation_table};
use crate::commands::plot::{write_boxplot, write_histogram};
use crate::context::AppContext;
use crate::output;

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub output_dir: PathBuf,
    /// Bootstrap seed actually used, when mediation ran.
    pub seed: Option<u64>,
    pub artifacts: Vec<PathBuf>,
}

struct Exports<'a> {
    ctx: &'a AppContext,
    quiet: bool,
    written: Vec<PathBuf>,
}

impl Exports<'_> {
    fn table(&mut self, id: &str, artifact: Artifact, table: &ReportTable) -> anyhow::Result<()> {
        let path = self
            .ctx
            .writer
            .write_table(id, artifact, table)
            .with_context(|| format!("failed to export report '{id}'"))?;
        self.record(path);
        Ok(())
    }

    fn record(&mut self, path: PathBuf) {
        if !self.quiet {
            eprintln!("wrote {}", path.display());
        }
        self.written.push(path);
    }
}

/// Handle `plend run`. Exports always; `--export` is implied.
pub fn handle(args: &RunArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let analysis = ctx.analysis();
    let decimals = ctx.decimals();
    let config = &ctx.config;
    let mut exports = Exports {
        ctx,
        quiet: flags.quiet,
        written: Vec::new(),
    };

    // ---------------------------------------------------------------------------
    // Descriptives and reliability
    // ---------------------------------------------------------------------------

    let descriptives = describe(&analysis, &[]);
    let table = ReportTable::from_descriptives("Descriptive statistics", &descriptives, decimals);
    exports.table("Descriptives", Artifact::Results, &table)?;

    let reports = composite_reports(ctx)?;
    exports.table(
        "Reliability",
        Artifact::Results,
        &reliability_table(&reports, decimals),
    )?;

    // ---------------------------------------------------------------------------
    // Hypotheses and comparisons
    // ---------------------------------------------------------------------------

    for hypothesis in &config.hypotheses {
        let fit = simple_regression(&analysis, &hypothesis.independent, &hypothesis.dependent)
            .with_context(|| format!("hypothesis '{}' failed", hypothesis.id))?;
        let heading = format!(
            "{}: {} ~ {}",
            hypothesis.id, hypothesis.dependent, hypothesis.independent
        );
        let table = ReportTable::from_regression(heading, &fit, decimals);
        exports.table(&hypothesis.id, Artifact::Model, &table)?;
    }

    for comparison in &config.comparisons {
        let (result, table) = run_comparison(
            ctx,
            &comparison.id,
            &comparison.group,
            &comparison.value,
            comparison.grouping,
        )?;
        exports.table(
            &comparison.id,
            Artifact::Comparison(TestKind::of(&result.test)),
            &table,
        )?;
    }

    // ---------------------------------------------------------------------------
    // Correlations and factor suitability
    // ---------------------------------------------------------------------------

    let variables = &config.factor.variables;
    let matrix = correlate(&analysis, variables).context("correlation matrix failed")?;
    let table = ReportTable::from_correlation(
        "Correlations: Pearson correlations (pairwise complete)",
        &matrix,
        decimals,
    );
    exports.table("Correlations", Artifact::Summary, &table)?;

    let suitability = assess(&analysis, variables).context("factor suitability check failed")?;
    let table = ReportTable::from_suitability(
        "Factor: KMO and Bartlett's test",
        &suitability,
        decimals,
    );
    exports.table("Factor", Artifact::Summary, &table)?;

    // ---------------------------------------------------------------------------
    // Mediation
    // ---------------------------------------------------------------------------

    let seed = if args.skip_mediation {
        tracing::info!("mediation skipped");
        None
    } else {
        let fitted = fit_configured(ctx, None)?;
        let table = mediation_table("H2", &fitted, &fitted.summary_table(), decimals);
        exports.table("H2", Artifact::Summary, &table)?;
        Some(fitted.seed())
    };

    // ---------------------------------------------------------------------------
    // Plots
    // ---------------------------------------------------------------------------

    if config.report.plots && !args.no_plots {
        for comparison in &config.comparisons {
            let path = write_boxplot(
                ctx,
                &comparison.id,
                &comparison.group,
                &comparison.value,
                comparison.grouping,
            )?;
            exports.record(path);
        }
        for variable in variables {
            exports.record(write_histogram(ctx, variable, variable, None)?);
        }
    }

    tracing::info!(artifacts = exports.written.len(), "pipeline finished");
    let summary = RunSummary {
        rows: ctx.dataset.n_rows(),
        output_dir: ctx.writer.output_dir().to_path_buf(),
        seed,
        artifacts: exports.written,
    };
    output::output(&summary, flags.format)
}
