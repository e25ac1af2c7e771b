//! Writes report artifacts into one output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::docx::write_docx;
use crate::error::ReportError;
use crate::naming::{Artifact, artifact_path};
use crate::table::ReportTable;

/// Places tables and plots under `output_dir` using the naming convention.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn target(&self, id: &str, artifact: Artifact) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(artifact_path(&self.output_dir, id, artifact))
    }

    /// Write `table` as a `.docx` named for `artifact`.
    pub fn write_table(
        &self,
        id: &str,
        artifact: Artifact,
        table: &ReportTable,
    ) -> Result<PathBuf, ReportError> {
        table.ensure_rows()?;
        let path = self.target(id, artifact)?;
        write_docx(table, &path)?;
        tracing::info!(path = %path.display(), "report table written");
        Ok(path)
    }

    /// Write an already rendered SVG plot.
    pub fn write_plot(
        &self,
        id: &str,
        artifact: Artifact,
        svg: &str,
    ) -> Result<PathBuf, ReportError> {
        let path = self.target(id, artifact)?;
        fs::write(&path, svg)?;
        tracing::info!(path = %path.display(), "plot written");
        Ok(path)
    }
}
