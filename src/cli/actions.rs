//! Action item command handlers.

use crate::config::AppConfig;
use crate::model::{ActionItem, ActionItemStatus};
use crate::pipeline::{ReportSubject, Workspace, output_report};
use crate::reports::ReportConfig;
use crate::viewmodel::action_groups;
use anyhow::{Context, Result};

fn open_workspace(config: &AppConfig) -> Result<Workspace> {
    Workspace::load(&config.state.path, config.reconcile.normalize_material_case)
}

/// List action items grouped by BOM code.
pub fn run_actions_list(
    config: &AppConfig,
    bom_code: Option<&str>,
    expand_all: bool,
) -> Result<()> {
    let workspace = open_workspace(config)?;
    let items = match bom_code {
        Some(code) => workspace.actions.list_for(code),
        None => workspace.actions.list(),
    };
    let groups = action_groups(&items, config.view.preview_limit);
    let mut report_config = ReportConfig::default()
        .with_preview_limit(config.view.preview_limit)
        .expand_all(expand_all);
    if let Some(code) = bom_code {
        report_config = report_config.expand(code.to_string());
    }
    output_report(config, ReportSubject::Actions(&groups), &report_config)
}

/// Move one action item to a new status.
pub fn run_set_status(config: &AppConfig, id: u64, status: ActionItemStatus) -> Result<ActionItem> {
    let workspace = open_workspace(config)?;
    let item = workspace
        .actions
        .update_status(id, status)
        .with_context(|| format!("Failed to update action item {id}"))?;
    workspace.save(&config.state.path)?;
    Ok(item)
}

/// Delete every action item of a BOM code so it can be finalized afresh.
pub fn run_reset(config: &AppConfig, bom_code: &str) -> Result<usize> {
    let workspace = open_workspace(config)?;
    let removed = workspace.actions.reset(bom_code);
    if removed > 0 {
        workspace.save(&config.state.path)?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{FinalizeSelection, SelectedItem};
    use crate::config::AppConfigBuilder;
    use tempfile::TempDir;

    fn seeded() -> (TempDir, AppConfig, Vec<ActionItem>) {
        let tmp = TempDir::new().unwrap();
        let config = AppConfigBuilder::default()
            .state_path(tmp.path().join("state.json"))
            .build();
        let workspace = open_workspace(&config).unwrap();
        let selection = FinalizeSelection {
            shortages: vec![SelectedItem::new("CAP-100", 2)],
            unlisted: vec![SelectedItem::new("DIODE-9", 1)],
        };
        let created = workspace.actions.finalize("BC-01", &selection, None).unwrap();
        workspace.save(&config.state.path).unwrap();
        (tmp, config, created)
    }

    #[test]
    fn test_set_status_persists() {
        let (_tmp, config, created) = seeded();
        let id = created[0].id;
        let item = run_set_status(&config, id, ActionItemStatus::Ditindaklanjuti).unwrap();
        assert_eq!(item.status, ActionItemStatus::Ditindaklanjuti);

        let workspace = open_workspace(&config).unwrap();
        assert_eq!(
            workspace.actions.get(id).unwrap().status,
            ActionItemStatus::Ditindaklanjuti
        );
    }

    #[test]
    fn test_set_status_rejects_reopen() {
        let (_tmp, config, created) = seeded();
        let id = created[1].id;
        run_set_status(&config, id, ActionItemStatus::Selesai).unwrap();
        assert!(run_set_status(&config, id, ActionItemStatus::BaruMasuk).is_err());
    }

    #[test]
    fn test_reset_removes_items() {
        let (_tmp, config, _) = seeded();
        assert_eq!(run_reset(&config, "BC-01").unwrap(), 2);
        assert_eq!(run_reset(&config, "BC-01").unwrap(), 0);
        assert!(open_workspace(&config).unwrap().actions.list().is_empty());
    }
}
