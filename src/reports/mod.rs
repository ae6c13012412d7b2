//! Report generation for reconciliations, BOM tables and action items.
//!
//! Three output formats are available:
//! - JSON: Structured data for programmatic integration
//! - Summary: Compact shell-friendly output
//! - Table: Aligned tabular terminal output

mod json;
mod summary;
mod types;

pub use json::JsonReporter;
pub use summary::{SummaryReporter, TableReporter};
pub use types::{ReportConfig, ReportFormat};

use crate::model::AggregatedBomRow;
use crate::reconcile::ReconcileResult;
use crate::viewmodel::{ActionGroupView, BomGroupView};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Generate a report from a reconciliation result
    fn generate_reconcile_report(
        &self,
        result: &ReconcileResult,
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Generate the grouped BOM table
    fn generate_bom_report(
        &self,
        groups: &[BomGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Generate the flat (non-versioned) BOM listing
    fn generate_flat_report(
        &self,
        rows: &[AggregatedBomRow],
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Generate the grouped action item table
    fn generate_action_report(
        &self,
        groups: &[ActionGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Write a reconciliation report to a writer
    fn write_reconcile_report(
        &self,
        result: &ReconcileResult,
        config: &ReportConfig,
        writer: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let report = self.generate_reconcile_report(result, config)?;
        writer.write_all(report.as_bytes())?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    create_reporter_with_options(format, true)
}

/// Create a report generator with color control
#[must_use]
pub fn create_reporter_with_options(
    format: ReportFormat,
    use_color: bool,
) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Auto | ReportFormat::Summary => {
            if use_color {
                Box::new(SummaryReporter::new())
            } else {
                Box::new(SummaryReporter::new().no_color())
            }
        }
        ReportFormat::Json => Box::new(JsonReporter::new()),
        ReportFormat::Table => {
            if use_color {
                Box::new(TableReporter::new())
            } else {
                Box::new(TableReporter::new().no_color())
            }
        }
    }
}
