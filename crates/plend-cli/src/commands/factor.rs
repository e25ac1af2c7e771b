use anyhow::Context;
use plend_report::{Artifact, ReportTable};
use plend_stats::assess;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::VariablesArgs;
use crate::commands::shared::{export_table, variables_or_default};
use crate::context::AppContext;
use crate::output;

/// Handle `plend factor`.
pub fn handle(args: &VariablesArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let variables = variables_or_default(&args.variables, ctx);
    let suitability =
        assess(&ctx.analysis(), &variables).context("factor suitability check failed")?;

    let id = args.id.as_deref().unwrap_or("Factor");
    let table = ReportTable::from_suitability(
        format!("{id}: KMO and Bartlett's test"),
        &suitability,
        ctx.decimals(),
    );
    export_table(ctx, flags, id, Artifact::Summary, &table)?;
    output::emit(&suitability, &table, flags.format)
}
