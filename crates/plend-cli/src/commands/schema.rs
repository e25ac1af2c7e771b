use plend_stats::{
    Descriptive, EffectRow, FactorSuitability, GroupComparison, MediationSummary,
    RegressionSummary,
};
use schemars::schema_for;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaType};

/// JSON Schema of one result type.
pub fn schema_value(type_name: SchemaType) -> anyhow::Result<serde_json::Value> {
    let schema = match type_name {
        SchemaType::EffectRow => schema_for!(EffectRow),
        SchemaType::MediationSummary => schema_for!(MediationSummary),
        SchemaType::RegressionSummary => schema_for!(RegressionSummary),
        SchemaType::GroupComparison => schema_for!(GroupComparison),
        SchemaType::FactorSuitability => schema_for!(FactorSuitability),
        SchemaType::Descriptive => schema_for!(Descriptive),
    };
    Ok(serde_json::to_value(schema)?)
}

/// Handle `plend schema`. Always JSON; `--format raw` prints it on one line.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schema_value(args.type_name)?;
    let rendered = if flags.format == crate::cli::OutputFormat::Raw {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };
    println!("{rendered}");
    Ok(())
}
