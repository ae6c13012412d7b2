//! Reconcile and finalize command handlers.

use crate::actions::FinalizeSelection;
use crate::config::AppConfig;
use crate::model::{ActionItem, normalize_material};
use crate::pipeline::{
    LoadedInputs, ReportSubject, exit_codes, load_inputs, output_report, write_proposal,
};
use crate::reconcile::{Classification, ReconcileEngine, ReconcileResult};
use crate::reports::ReportConfig;
use crate::viewmodel::action_groups;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

/// Inputs of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Observation record or detector output
    pub observation: PathBuf,
    /// BOM code; required for detector output
    pub bom_code: Option<String>,
    /// Version to compare against instead of the active one
    pub version_tag: Option<String>,
    /// Write the default finalize proposal to this file
    pub proposal_file: Option<PathBuf>,
}

/// Load the workspace and observation, then reconcile.
fn reconcile_inputs(
    config: &AppConfig,
    options: &ReconcileOptions,
) -> Result<(LoadedInputs, ReconcileResult)> {
    let upper_case = config.reconcile.normalize_material_case;
    let mut inputs = load_inputs(
        &config.state.path,
        &options.observation,
        options.bom_code.as_deref(),
        upper_case,
    )?;
    if let Some(tag) = &options.version_tag {
        inputs.observation.version_tag = Some(tag.clone());
    }

    let engine = ReconcileEngine::from_config(&config.reconcile);
    let result = engine
        .reconcile_observation(&inputs.workspace.catalog, &inputs.observation)
        .with_context(|| format!("Failed to reconcile {}", inputs.observation.bom_code))?;
    Ok((inputs, result))
}

/// Run the reconcile command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
pub fn run_reconcile(config: &AppConfig, options: &ReconcileOptions) -> Result<i32> {
    let (_, result) = reconcile_inputs(config, options)?;

    if let Some(path) = &options.proposal_file {
        write_proposal(config, &result, path)?;
    }

    let report_config = ReportConfig::default().with_preview_limit(config.view.preview_limit);
    output_report(config, ReportSubject::Reconcile(&result), &report_config)?;
    Ok(determine_exit_code(config, &result))
}

/// Determine the exit code from the findings and the fail flags.
#[must_use]
pub fn determine_exit_code(config: &AppConfig, result: &ReconcileResult) -> i32 {
    if config.behavior.fail_on_unlisted && result.summary.unlisted > 0 {
        return exit_codes::UNLISTED_FOUND;
    }
    if config.behavior.fail_on_shortage && result.summary.shortages > 0 {
        return exit_codes::SHORTAGES_FOUND;
    }
    exit_codes::SUCCESS
}

/// Inputs of a finalize run.
#[derive(Debug, Clone, Default)]
pub struct FinalizeOptions {
    pub reconcile: ReconcileOptions,
    /// Reviewed selection; the default proposal is used when absent
    pub selection_file: Option<PathBuf>,
    /// Materials to drop from the selection
    pub exclude: Vec<String>,
}

/// Reconcile, then commit the selection as a new batch of action items.
pub fn run_finalize(config: &AppConfig, options: &FinalizeOptions) -> Result<Vec<ActionItem>> {
    let (inputs, result) = reconcile_inputs(config, &options.reconcile)?;
    let upper_case = config.reconcile.normalize_material_case;

    let mut selection = match &options.selection_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read selection: {}", path.display()))?;
            let mut selection: FinalizeSelection = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse selection: {}", path.display()))?;
            for item in selection.shortages.iter_mut().chain(selection.unlisted.iter_mut()) {
                item.material = normalize_material(&item.material, upper_case);
            }
            selection
        }
        None => result.proposal(&config.finalize),
    };
    for material in &options.exclude {
        selection.deselect(&normalize_material(material, upper_case));
    }
    check_selection(&result, &selection)?;

    let workspace = inputs.workspace;
    let created = workspace
        .actions
        .finalize(&result.bom_code, &selection, Some(result.fingerprint))
        .with_context(|| format!("Failed to finalize {}", result.bom_code))?;
    workspace.save(&config.state.path)?;

    let groups = action_groups(
        &workspace.actions.list_for(&result.bom_code),
        config.view.preview_limit,
    );
    let report_config = ReportConfig::default()
        .with_preview_limit(config.view.preview_limit)
        .expand(result.bom_code.clone());
    output_report(config, ReportSubject::Actions(&groups), &report_config)?;
    Ok(created)
}

/// Every selected material must be a finding of the matching kind.
fn check_selection(result: &ReconcileResult, selection: &FinalizeSelection) -> Result<()> {
    let lists = [
        (Classification::Shortage, &selection.shortages),
        (Classification::Unlisted, &selection.unlisted),
    ];
    for (expected, list) in lists {
        for item in list {
            match result.find(&item.material) {
                Some(detail) if detail.classification == expected => {}
                Some(detail) => bail!(
                    "{} is {} in this reconciliation, not {}",
                    item.material,
                    detail.classification.label().to_lowercase(),
                    expected.label().to_lowercase()
                ),
                None => bail!(
                    "{} has no difference in this reconciliation of {}",
                    item.material,
                    result.bom_code
                ),
            }
        }
    }
    Ok(())
}
