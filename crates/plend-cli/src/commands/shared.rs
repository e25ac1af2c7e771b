use std::path::PathBuf;

use anyhow::Context;
use plend_report::{Artifact, ReportTable};

use crate::cli::GlobalFlags;
use crate::context::AppContext;

/// Write `table` when `--export` is set.
pub fn export_table(
    ctx: &AppContext,
    flags: &GlobalFlags,
    id: &str,
    artifact: Artifact,
    table: &ReportTable,
) -> anyhow::Result<Option<PathBuf>> {
    if !flags.export {
        return Ok(None);
    }
    let path = ctx
        .writer
        .write_table(id, artifact, table)
        .with_context(|| format!("failed to export report '{id}'"))?;
    if !flags.quiet {
        eprintln!("wrote {}", path.display());
    }
    Ok(Some(path))
}

/// Variables from the command line, or the configured factor set.
pub fn variables_or_default(given: &[String], ctx: &AppContext) -> Vec<String> {
    if given.is_empty() {
        ctx.config.factor.variables.clone()
    } else {
        given.to_vec()
    }
}
