use anyhow::Context;
use plend_report::{Artifact, ReportTable};
use plend_stats::correlate;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::VariablesArgs;
use crate::commands::shared::{export_table, variables_or_default};
use crate::context::AppContext;
use crate::output;

/// Handle `plend correlate`.
pub fn handle(args: &VariablesArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let variables = variables_or_default(&args.variables, ctx);
    let matrix = correlate(&ctx.analysis(), &variables).context("correlation matrix failed")?;

    let id = args.id.as_deref().unwrap_or("Correlations");
    let table = ReportTable::from_correlation(
        format!("{id}: Pearson correlations (pairwise complete)"),
        &matrix,
        ctx.decimals(),
    );
    export_table(ctx, flags, id, Artifact::Summary, &table)?;
    output::emit(&matrix, &table, flags.format)
}
