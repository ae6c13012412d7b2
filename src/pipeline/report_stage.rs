//! Report output stage.
//!
//! Renders reports for the terminal, a pipe or the configured report file,
//! and writes the finalize proposal as a separate JSON artifact so that a
//! reviewer can edit it and hand it back to `finalize --selection`.

use crate::actions::FinalizeSelection;
use crate::config::{AppConfig, OutputConfig};
use crate::model::AggregatedBomRow;
use crate::reconcile::ReconcileResult;
use crate::reports::{ReportConfig, ReportFormat, create_reporter_with_options};
use crate::viewmodel::{ActionGroupView, BomGroupView};
use anyhow::{Context, Result, bail};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use super::PipelineError;
use super::state::write_atomic;

/// What a report is generated for.
#[derive(Debug, Clone, Copy)]
pub enum ReportSubject<'a> {
    Reconcile(&'a ReconcileResult),
    Boms(&'a [BomGroupView]),
    Flat(&'a [AggregatedBomRow]),
    Actions(&'a [ActionGroupView]),
}

impl ReportSubject<'_> {
    const fn name(self) -> &'static str {
        match self {
            Self::Reconcile(_) => "reconcile",
            Self::Boms(_) => "boms",
            Self::Flat(_) => "flat",
            Self::Actions(_) => "actions",
        }
    }
}

/// Where a rendered report ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDestination {
    /// Interactive stdout
    Terminal,
    /// Redirected stdout
    Pipe,
    /// The configured report file
    File(PathBuf),
}

impl ReportDestination {
    /// The report file when one is configured, else stdout as detected.
    #[must_use]
    pub fn from_config(output: &OutputConfig) -> Self {
        match &output.file {
            Some(path) => Self::File(path.clone()),
            None if std::io::stdout().is_terminal() => Self::Terminal,
            None => Self::Pipe,
        }
    }

    /// Resolve `auto`: the summary for a reviewer at a terminal, JSON for
    /// everything consumed by other tools.
    #[must_use]
    pub fn format_for(&self, format: ReportFormat) -> ReportFormat {
        match (format, self) {
            (ReportFormat::Auto, Self::Terminal) => ReportFormat::Summary,
            (ReportFormat::Auto, _) => ReportFormat::Json,
            (other, _) => other,
        }
    }

    /// Colors only reach a terminal, and never with `--no-color` or `NO_COLOR`.
    #[must_use]
    pub fn use_color(&self, output: &OutputConfig) -> bool {
        matches!(self, Self::Terminal)
            && !output.no_color
            && std::env::var_os("NO_COLOR").is_none()
    }

    fn write(&self, report: &str, quiet: bool) -> Result<()> {
        match self {
            Self::Terminal | Self::Pipe => {
                println!("{report}");
                Ok(())
            }
            Self::File(path) => {
                std::fs::write(path, report)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                if !quiet {
                    tracing::info!("Report written to {}", path.display());
                }
                Ok(())
            }
        }
    }
}

/// Render `subject` with the configured reporter and write it out.
pub fn output_report(
    config: &AppConfig,
    subject: ReportSubject<'_>,
    report_config: &ReportConfig,
) -> Result<()> {
    let destination = ReportDestination::from_config(&config.output);
    let report = render_for(config, &destination, subject, report_config)?;
    destination.write(&report, config.behavior.quiet)
}

/// Render `subject` without writing it.
pub fn render_report(
    config: &AppConfig,
    subject: ReportSubject<'_>,
    report_config: &ReportConfig,
) -> Result<String> {
    let destination = ReportDestination::from_config(&config.output);
    render_for(config, &destination, subject, report_config)
}

fn render_for(
    config: &AppConfig,
    destination: &ReportDestination,
    subject: ReportSubject<'_>,
    report_config: &ReportConfig,
) -> Result<String> {
    let format = destination.format_for(config.output.format);
    let reporter = create_reporter_with_options(format, destination.use_color(&config.output));
    tracing::debug!("Rendering {} report as {}", subject.name(), format);

    let rendered = match subject {
        ReportSubject::Reconcile(result) => {
            reporter.generate_reconcile_report(result, report_config)
        }
        ReportSubject::Boms(groups) => reporter.generate_bom_report(groups, report_config),
        ReportSubject::Flat(rows) => reporter.generate_flat_report(rows, report_config),
        ReportSubject::Actions(groups) => reporter.generate_action_report(groups, report_config),
    };
    rendered.map_err(|e| {
        PipelineError::ReportFailed {
            source: anyhow::Error::new(e),
        }
        .into()
    })
}

/// Write the finalize proposal of `result` next to the report.
///
/// The proposal must not share a path with the report file, otherwise one
/// would overwrite the other.
pub fn write_proposal(
    config: &AppConfig,
    result: &ReconcileResult,
    path: &Path,
) -> Result<FinalizeSelection> {
    if config.output.file.as_deref() == Some(path) {
        bail!(
            "Proposal file {} is also the report file; choose another path",
            path.display()
        );
    }
    let proposal = result.proposal(&config.finalize);
    let json = serde_json::to_string_pretty(&proposal).context("Failed to serialize proposal")?;
    write_atomic(path, &json)
        .with_context(|| format!("Failed to write proposal to {}", path.display()))?;
    if !config.behavior.quiet {
        tracing::info!(
            "Proposal for {} with {} items written to {}",
            result.bom_code,
            proposal.len(),
            path.display()
        );
    }
    Ok(proposal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::fixtures::sample_result;

    #[test]
    fn test_auto_format_by_destination() {
        let file = ReportDestination::File(PathBuf::from("recon.json"));
        assert_eq!(
            ReportDestination::Terminal.format_for(ReportFormat::Auto),
            ReportFormat::Summary
        );
        assert_eq!(
            ReportDestination::Pipe.format_for(ReportFormat::Auto),
            ReportFormat::Json
        );
        assert_eq!(file.format_for(ReportFormat::Auto), ReportFormat::Json);
        assert_eq!(file.format_for(ReportFormat::Table), ReportFormat::Table);
    }

    #[test]
    fn test_color_only_on_terminal() {
        let output = OutputConfig::default();
        assert!(!ReportDestination::Pipe.use_color(&output));
        assert!(!ReportDestination::File(PathBuf::from("r.txt")).use_color(&output));

        let no_color = OutputConfig {
            no_color: true,
            ..OutputConfig::default()
        };
        assert!(!ReportDestination::Terminal.use_color(&no_color));
    }

    #[test]
    fn test_configured_file_is_destination() {
        let output = OutputConfig {
            file: Some(PathBuf::from("recon.json")),
            ..OutputConfig::default()
        };
        assert_eq!(
            ReportDestination::from_config(&output),
            ReportDestination::File(PathBuf::from("recon.json"))
        );
    }

    #[test]
    fn test_render_report_honours_format() {
        let config = AppConfig::builder()
            .output_format(ReportFormat::Table)
            .no_color(true)
            .build();
        let result = sample_result();
        let report = render_report(
            &config,
            ReportSubject::Reconcile(&result),
            &ReportConfig::default(),
        )
        .unwrap();
        assert!(report.starts_with("CLASS"));
    }

    #[test]
    fn test_output_report_writes_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("recon.json");
        let config = AppConfig::builder()
            .output_file(Some(path.clone()))
            .quiet(true)
            .build();
        let result = sample_result();
        output_report(&config, ReportSubject::Reconcile(&result), &ReportConfig::default())
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["bomCode"], "BC-01");
    }

    #[test]
    fn test_write_proposal_separate_from_report() {
        let tmp = tempfile::TempDir::new().unwrap();
        let report = tmp.path().join("recon.json");
        let proposal_path = tmp.path().join("proposal.json");
        let config = AppConfig::builder()
            .output_file(Some(report.clone()))
            .quiet(true)
            .build();
        let result = sample_result();

        let proposal = write_proposal(&config, &result, &proposal_path).unwrap();
        let written: FinalizeSelection =
            serde_json::from_str(&std::fs::read_to_string(&proposal_path).unwrap()).unwrap();
        assert_eq!(written, proposal);
        assert_eq!(written, result.proposal(&config.finalize));

        assert!(write_proposal(&config, &result, &report).is_err());
        assert!(!report.exists());
    }
}
