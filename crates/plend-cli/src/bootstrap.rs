use anyhow::Context;
use plend_config::PlendConfig;

use crate::cli::GlobalFlags;

/// Resolve configuration: defaults, user and project files, `--config`,
/// `.env` and `PLEND_*` variables.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<PlendConfig> {
    let config = PlendConfig::load_with_dotenv(flags.config.as_deref())
        .context("failed to load plend configuration")?;
    tracing::debug!(
        data = %config.data.path,
        resamples = config.mediation.bootstrap,
        "configuration loaded"
    );
    Ok(config)
}
