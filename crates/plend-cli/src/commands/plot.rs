use std::path::PathBuf;

use anyhow::Context;
use plend_report::{Artifact, boxplot, histogram};
use plend_stats::group_values;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::PlotCommands;
use crate::context::AppContext;
use crate::output;

#[derive(Debug, Serialize)]
pub struct PlotOutput {
    pub plot: &'static str,
    pub path: PathBuf,
}

/// Render and write a boxplot of `value` by `group`.
pub fn write_boxplot(
    ctx: &AppContext,
    id: &str,
    group: &str,
    value: &str,
    grouping: plend_core::GroupingStrategy,
) -> anyhow::Result<PathBuf> {
    let grouped = group_values(&ctx.analysis(), group, value, grouping)
        .with_context(|| format!("cannot group {value} by {group}"))?;
    let svg = boxplot(&format!("{value} by {group}"), value, &grouped)?;
    Ok(ctx.writer.write_plot(id, Artifact::Boxplot, &svg)?)
}

/// Render and write a histogram of one column.
pub fn write_histogram(
    ctx: &AppContext,
    id: &str,
    variable: &str,
    bins: Option<usize>,
) -> anyhow::Result<PathBuf> {
    let column = ctx.dataset.column_id(variable)?;
    let svg = histogram(
        &format!("Distribution of {variable}"),
        variable,
        ctx.dataset.values(column),
        bins,
    )?;
    Ok(ctx.writer.write_plot(id, Artifact::Histogram, &svg)?)
}

/// Handle `plend plot`.
pub fn handle(kind: &PlotCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let result = match kind {
        PlotCommands::Boxplot {
            group,
            value,
            grouping,
            id,
        } => PlotOutput {
            plot: "boxplot",
            path: write_boxplot(ctx, id.as_deref().unwrap_or(group), group, value, *grouping)?,
        },
        PlotCommands::Histogram { variable, bins, id } => PlotOutput {
            plot: "histogram",
            path: write_histogram(ctx, id.as_deref().unwrap_or(variable), variable, *bins)?,
        },
    };
    output::output(&result, flags.format)
}
