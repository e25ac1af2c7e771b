use anyhow::Context;
use plend_report::{Artifact, ReportTable};
use plend_stats::regress;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RegressArgs;
use crate::commands::shared::export_table;
use crate::context::AppContext;
use crate::output;

/// Handle `plend regress`.
pub fn handle(args: &RegressArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let summary = regress(&ctx.analysis(), &args.predictors, &args.dependent)
        .with_context(|| format!("regression of {} failed", args.dependent))?;

    let id = args.id.as_deref().unwrap_or("Regression");
    let heading = format!("{id}: {} ~ {}", args.dependent, args.predictors.join(" + "));
    let table = ReportTable::from_regression(heading, &summary, ctx.decimals());
    export_table(ctx, flags, id, Artifact::Model, &table)?;
    output::emit(&summary, &table, flags.format)
}
