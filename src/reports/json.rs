//! JSON report generator.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::model::AggregatedBomRow;
use crate::reconcile::{CompareItemDetail, ReconcileResult, ReconcileSummary};
use crate::viewmodel::{ActionGroupView, BomGroupView};
use chrono::Utc;
use serde::Serialize;

/// JSON report generator
pub struct JsonReporter {
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: true }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn render<T: Serialize>(&self, report: &T) -> Result<String, ReportError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_reconcile_report(
        &self,
        result: &ReconcileResult,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        self.render(&JsonReconcileReport {
            metadata: JsonReportMetadata::new(config),
            bom_code: &result.bom_code,
            version_tag: &result.version_tag,
            fingerprint: result.fingerprint_hex(),
            summary: &result.summary,
            items: &result.items,
        })
    }

    fn generate_bom_report(
        &self,
        groups: &[BomGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        self.render(&JsonGroupedReport {
            metadata: JsonReportMetadata::new(config),
            groups,
        })
    }

    fn generate_flat_report(
        &self,
        rows: &[AggregatedBomRow],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        self.render(&JsonFlatReport {
            metadata: JsonReportMetadata::new(config),
            rows,
        })
    }

    fn generate_action_report(
        &self,
        groups: &[ActionGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        self.render(&JsonGroupedReport {
            metadata: JsonReportMetadata::new(config),
            groups,
        })
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

// JSON structures for serialization

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReportMetadata {
    tool: ToolInfo,
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

impl JsonReportMetadata {
    fn new(config: &ReportConfig) -> Self {
        Self {
            tool: ToolInfo {
                name: "bom-recon".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            generated_at: Utc::now().to_rfc3339(),
            title: config.title.clone(),
        }
    }
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    version: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReconcileReport<'a> {
    metadata: JsonReportMetadata,
    bom_code: &'a str,
    version_tag: &'a str,
    fingerprint: String,
    summary: &'a ReconcileSummary,
    items: &'a [CompareItemDetail],
}

#[derive(Serialize)]
struct JsonFlatReport<'a> {
    metadata: JsonReportMetadata,
    rows: &'a [AggregatedBomRow],
}

#[derive(Serialize)]
struct JsonGroupedReport<'a, T> {
    metadata: JsonReportMetadata,
    groups: &'a [T],
}
