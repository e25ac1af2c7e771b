use anyhow::Context;
use plend_core::GroupingStrategy;
use plend_report::{Artifact, ReportTable, TestKind};
use plend_stats::{GroupComparison, compare_groups};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CompareArgs;
use crate::commands::shared::export_table;
use crate::context::AppContext;
use crate::output;

/// Run one comparison and build its report table.
pub fn run_comparison(
    ctx: &AppContext,
    id: &str,
    group: &str,
    value: &str,
    grouping: GroupingStrategy,
) -> anyhow::Result<(GroupComparison, ReportTable)> {
    let comparison = compare_groups(&ctx.analysis(), group, value, grouping)
        .with_context(|| format!("comparison '{id}' ({value} by {group}) failed"))?;
    let heading = format!("{id}: {} of {value} by {group}", comparison.test.name());
    let table = ReportTable::from_comparison(heading, &comparison, ctx.decimals());
    Ok((comparison, table))
}

/// Handle `plend compare`.
pub fn handle(args: &CompareArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let id = args.id.as_deref().unwrap_or(&args.group);
    let (comparison, table) = run_comparison(ctx, id, &args.group, &args.value, args.grouping)?;
    let artifact = Artifact::Comparison(TestKind::of(&comparison.test));
    export_table(ctx, flags, id, artifact, &table)?;
    output::emit(&comparison, &table, flags.format)
}
