use clap::{Args, Subcommand, ValueEnum};
use plend_core::{EffectLabel, GroupingStrategy};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Descriptive statistics per column.
    Describe(DescribeArgs),
    /// Build composite scores and report Cronbach's alpha.
    Composites,
    /// Ordinary least-squares regression.
    Regress(RegressArgs),
    /// Pairwise-complete Pearson correlation matrix.
    Correlate(VariablesArgs),
    /// Welch t-test or one-way ANOVA across groups.
    Compare(CompareArgs),
    /// KMO sampling adequacy and Bartlett's sphericity test.
    Factor(VariablesArgs),
    /// Parallel two-mediator model with bootstrap inference.
    Mediate(MediateArgs),
    /// Render a boxplot or histogram as SVG.
    Plot {
        #[command(subcommand)]
        kind: PlotCommands,
    },
    /// Run the full configured pipeline once and write every report.
    Run(RunArgs),
    /// Dump JSON schema for a result type.
    Schema(SchemaArgs),
}

/// Arguments for `plend describe`.
#[derive(Clone, Debug, Args)]
pub struct DescribeArgs {
    /// Columns to describe (default: every non-item column).
    pub columns: Vec<String>,
}

/// Arguments for `plend regress`.
#[derive(Clone, Debug, Args)]
pub struct RegressArgs {
    /// Dependent variable.
    pub dependent: String,
    /// One or more predictors.
    #[arg(required = true)]
    pub predictors: Vec<String>,
    /// Analysis id used for the exported file name.
    #[arg(long)]
    pub id: Option<String>,
}

/// Variable list shared by `plend correlate` and `plend factor`.
#[derive(Clone, Debug, Args)]
pub struct VariablesArgs {
    /// Variables to include (default: `factor.variables`).
    pub variables: Vec<String>,
    /// Analysis id used for the exported file name.
    #[arg(long)]
    pub id: Option<String>,
}

/// Arguments for `plend compare`.
#[derive(Clone, Debug, Args)]
pub struct CompareArgs {
    /// Column defining the groups.
    pub group: String,
    /// Column compared across groups.
    pub value: String,
    /// factor | median_split | quartiles
    #[arg(long, default_value = "factor")]
    pub grouping: GroupingStrategy,
    /// Analysis id used for exported file names.
    #[arg(long)]
    pub id: Option<String>,
}

/// Arguments for `plend mediate`.
#[derive(Clone, Debug, Args)]
pub struct MediateArgs {
    /// Bootstrap resamples (overrides `mediation.bootstrap`).
    #[arg(long)]
    pub resamples: Option<usize>,
    /// Effect labels to extract, comma separated (default: summary table).
    #[arg(long, value_delimiter = ',')]
    pub effects: Vec<EffectLabel>,
    /// Analysis id used for the exported file name.
    #[arg(long, default_value = "H2")]
    pub id: String,
}

/// Plot kinds.
#[derive(Clone, Debug, Subcommand)]
pub enum PlotCommands {
    /// Boxplot of a value by group.
    Boxplot {
        group: String,
        value: String,
        #[arg(long, default_value = "median_split")]
        grouping: GroupingStrategy,
        #[arg(long)]
        id: Option<String>,
    },
    /// Histogram of one variable.
    Histogram {
        variable: String,
        /// Bin count (default: Sturges' rule).
        #[arg(long)]
        bins: Option<usize>,
        #[arg(long)]
        id: Option<String>,
    },
}

/// Arguments for `plend run`.
#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Skip the bootstrap mediation model.
    #[arg(long)]
    pub skip_mediation: bool,
    /// Skip plots even when `report.plots` is on.
    #[arg(long)]
    pub no_plots: bool,
}

/// Result types with a published JSON schema.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaType {
    EffectRow,
    MediationSummary,
    RegressionSummary,
    GroupComparison,
    FactorSuitability,
    Descriptive,
}

/// Arguments for `plend schema`.
#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Type to describe.
    pub type_name: SchemaType,
}
