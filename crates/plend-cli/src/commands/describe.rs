use anyhow::Context;
use plend_report::{Artifact, ReportTable};
use plend_stats::describe;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::DescribeArgs;
use crate::commands::shared::export_table;
use crate::context::AppContext;
use crate::output;

/// Handle `plend describe`.
pub fn handle(args: &DescribeArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let ids = ctx
        .dataset
        .column_ids(&args.columns)
        .context("cannot describe an unknown column")?;
    let rows = describe(&ctx.analysis(), &ids);
    let table = ReportTable::from_descriptives("Descriptive statistics", &rows, ctx.decimals());
    export_table(ctx, flags, "Descriptives", Artifact::Results, &table)?;
    output::emit(&rows, &table, flags.format)
}
