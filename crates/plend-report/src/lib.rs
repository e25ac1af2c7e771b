//! # plend-report
//!
//! Turns analysis results into files a thesis can cite:
//!
//! - [`ReportTable`] builders for every result type, formatted once
//! - a minimal `.docx` writer (heading, generation stamp, table, notes)
//! - SVG boxplots and histograms
//! - the output naming convention (`<id>_Summary.docx`, `<id>_boxplot.svg`, ...)
//!
//! Exporting only creates files; analysis state is never touched.

pub mod docx;
pub mod error;
pub mod naming;
pub mod svg;
pub mod table;
pub mod writer;

pub use docx::{document_xml, write_docx, write_docx_to};
pub use error::ReportError;
pub use naming::{Artifact, TestKind, artifact_name, artifact_path, sanitize_id};
pub use svg::{BoxStats, boxplot, histogram, histogram_bins};
pub use table::{ReportTable, fmt_num, fmt_p};
pub use writer::ReportWriter;
