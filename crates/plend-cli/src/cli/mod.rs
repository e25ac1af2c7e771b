use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `plend` binary.
#[derive(Debug, Parser)]
#[command(
    name = "plend",
    version,
    about = "plend - survey analyses for private-lending decision research"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Survey CSV (overrides `data.path`)
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Extra configuration file merged over user and project config
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Report directory (overrides `report.output_dir`)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Bootstrap seed (overrides `mediation.seed`)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Also write .docx reports for the results
    #[arg(short, long, global = true)]
    pub export: bool,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            data: self.data.clone(),
            config: self.config.clone(),
            output: self.output.clone(),
            seed: self.seed,
            export: self.export,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use plend_core::{EffectLabel, GroupingStrategy};

    use super::root_commands::{PlotCommands, SchemaType};
    use super::{Cli, Commands, GlobalFlags, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "plend",
            "--format",
            "table",
            "--seed",
            "611",
            "--verbose",
            "composites",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.seed, Some(611));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Composites));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["plend", "run", "--format", "raw", "--quiet", "--export"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(cli.export);
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["plend", "--format", "xml", "composites"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_extraction_copies_values() {
        let cli = Cli::try_parse_from(["plend", "--data", "/tmp/survey.csv", "composites"])
            .expect("cli should parse");
        let flags: GlobalFlags = cli.global_flags();
        assert_eq!(
            flags.data.as_deref(),
            Some(std::path::Path::new("/tmp/survey.csv"))
        );
    }

    #[test]
    fn compare_parses_grouping_strategy() {
        let cli = Cli::try_parse_from([
            "plend",
            "compare",
            "ENT",
            "DEPNDT",
            "--grouping",
            "median_split",
        ])
        .expect("cli should parse");
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.grouping, GroupingStrategy::MedianSplit);
        assert_eq!(args.group, "ENT");
    }

    #[test]
    fn compare_rejects_unknown_grouping() {
        let parsed = Cli::try_parse_from([
            "plend",
            "compare",
            "ENT",
            "DEPNDT",
            "--grouping",
            "terciles",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn mediate_parses_effect_labels() {
        let cli = Cli::try_parse_from(["plend", "mediate", "--effects", "ind1,ind2,direct"])
            .expect("cli should parse");
        let Commands::Mediate(args) = cli.command else {
            panic!("expected mediate");
        };
        assert_eq!(
            args.effects,
            vec![EffectLabel::Ind1, EffectLabel::Ind2, EffectLabel::Direct]
        );
    }

    #[test]
    fn mediate_rejects_unknown_label() {
        assert!(Cli::try_parse_from(["plend", "mediate", "--effects", "ind3"]).is_err());
    }

    #[test]
    fn plot_histogram_parses() {
        let cli = Cli::try_parse_from(["plend", "plot", "histogram", "EO", "--bins", "8"])
            .expect("cli should parse");
        let Commands::Plot { kind } = cli.command else {
            panic!("expected plot");
        };
        assert!(matches!(
            kind,
            PlotCommands::Histogram { ref variable, bins: Some(8), .. } if variable == "EO"
        ));
    }

    #[test]
    fn schema_accepts_all_types() {
        for value in [
            "effect-row",
            "mediation-summary",
            "regression-summary",
            "group-comparison",
            "factor-suitability",
            "descriptive",
        ] {
            let cli = Cli::try_parse_from(["plend", "schema", value]).expect("cli should parse");
            assert!(matches!(cli.command, Commands::Schema(_)));
        }
        let cli = Cli::try_parse_from(["plend", "schema", "effect-row"]).unwrap();
        let Commands::Schema(args) = cli.command else {
            panic!("expected schema");
        };
        assert_eq!(args.type_name, SchemaType::EffectRow);
    }
}
