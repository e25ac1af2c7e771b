use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// A table reached the exporter without any body rows.
    #[error("Report table '{0}' has no rows")]
    EmptyTable(String),

    /// A plot was requested with no finite values to draw.
    #[error("Plot '{0}' has no values to draw")]
    EmptyPlot(String),

    /// Building an OOXML part failed.
    #[error("XML error: {0}")]
    Xml(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
