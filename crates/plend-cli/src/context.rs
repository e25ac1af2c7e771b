use std::path::PathBuf;

use anyhow::Context;
use plend_config::PlendConfig;
use plend_core::{CompositeSummary, Dataset, build_composites};
use plend_report::ReportWriter;
use plend_stats::{AnalysisContext, AnalysisSettings};

use crate::cli::GlobalFlags;

/// Loaded survey plus everything command handlers need.
///
/// Composites are built once here, before any analysis reads the dataset.
pub struct AppContext {
    pub config: PlendConfig,
    pub dataset: Dataset,
    pub composites: Vec<CompositeSummary>,
    pub settings: AnalysisSettings,
    pub writer: ReportWriter,
}

impl AppContext {
    pub fn load(mut config: PlendConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let path = flags
            .data
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.data.path));
        let mut dataset =
            Dataset::from_csv_path(&path, &config.survey_schema(), &config.missing_tokens())
                .with_context(|| format!("failed to load survey data from {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            columns = dataset.n_columns(),
            "survey loaded"
        );

        let composites = build_composites(&mut dataset, &config.composites)
            .context("failed to build composite scores")?;

        let dropped = config
            .reconcile_columns(|name| dataset.contains(name))
            .context("configured analyses name columns missing from the survey")?;
        for name in &dropped {
            tracing::warn!(column = %name, "optional column absent, left out of the factor check");
        }

        let settings = AnalysisSettings::from_config(&config).with_seed(flags.seed);
        let output_dir = flags
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.report.output_dir));

        Ok(Self {
            config,
            dataset,
            composites,
            settings,
            writer: ReportWriter::new(output_dir),
        })
    }

    #[must_use]
    pub fn analysis(&self) -> AnalysisContext<'_> {
        AnalysisContext::new(&self.dataset, self.settings)
    }

    #[must_use]
    pub const fn decimals(&self) -> usize {
        self.config.report.decimals
    }
}
