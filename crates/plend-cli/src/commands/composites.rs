use anyhow::Context;
use plend_core::CompositeSummary;
use plend_report::{Artifact, ReportTable};
use plend_stats::{Reliability, cronbach_alpha};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::shared::export_table;
use crate::context::AppContext;
use crate::output;

#[derive(Debug, Serialize)]
pub struct CompositeReport {
    pub composite: CompositeSummary,
    pub reliability: Reliability,
}

/// Alpha for every configured composite, paired with its build summary.
pub fn composite_reports(ctx: &AppContext) -> anyhow::Result<Vec<CompositeReport>> {
    let analysis = ctx.analysis();
    ctx.config
        .composites
        .iter()
        .zip(&ctx.composites)
        .map(|(group, summary)| {
            let reliability = cronbach_alpha(&analysis, group)
                .with_context(|| format!("reliability of composite '{}'", group.name))?;
            Ok(CompositeReport {
                composite: summary.clone(),
                reliability,
            })
        })
        .collect()
}

pub fn reliability_table(reports: &[CompositeReport], decimals: usize) -> ReportTable {
    let rows: Vec<Reliability> = reports.iter().map(|r| r.reliability.clone()).collect();
    let mut table = ReportTable::from_reliability("Composite reliability", &rows, decimals);
    for report in reports.iter().filter(|r| r.composite.undefined_rows > 0) {
        table.push_note(format!(
            "{}: {} rows with every item missing are undefined",
            report.composite.name, report.composite.undefined_rows
        ));
    }
    table
}

/// Handle `plend composites`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let reports = composite_reports(ctx)?;
    let table = reliability_table(&reports, ctx.decimals());
    export_table(ctx, flags, "Reliability", Artifact::Results, &table)?;
    output::emit(&reports, &table, flags.format)
}
