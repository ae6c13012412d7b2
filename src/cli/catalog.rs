//! Catalog command handlers: import, listing, activation and version edits.

use crate::catalog::{Activation, BatchReport, MaterialDraft, plan_version_edit};
use crate::config::AppConfig;
use crate::model::normalize_version_tag;
use crate::pipeline::{ReportSubject, Workspace, load_line_items, output_report};
use crate::reports::ReportConfig;
use crate::viewmodel::bom_groups;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

fn open_workspace(config: &AppConfig) -> Result<Workspace> {
    Workspace::load(&config.state.path, config.reconcile.normalize_material_case)
}

/// Replace the catalog entries of every BOM code found in a line item file.
pub fn run_import(config: &AppConfig, items_path: &Path) -> Result<BatchReport> {
    let items = load_line_items(items_path)?;
    let mut workspace = open_workspace(config)?;
    let report = workspace
        .import_items(items)
        .with_context(|| format!("Failed to import {}", items_path.display()))?;
    workspace.save(&config.state.path)?;
    if !config.behavior.quiet {
        tracing::info!(
            "Imported {} line items ({} replaced)",
            report.created.len(),
            report.deleted.len()
        );
    }
    Ok(report)
}

/// Options of the `boms` listing.
#[derive(Debug, Clone, Default)]
pub struct BomListOptions {
    /// Restrict the listing to one BOM code
    pub bom_code: Option<String>,
    /// Flat material rows instead of grouped tables
    pub flat: bool,
    /// Group keys shown expanded
    pub expand: Vec<String>,
    pub expand_all: bool,
}

/// Render the catalog grouped by BOM code, or as flat aggregated rows.
pub fn run_boms(config: &AppConfig, options: &BomListOptions) -> Result<()> {
    let workspace = open_workspace(config)?;
    let mut report_config = ReportConfig::default()
        .with_preview_limit(config.view.preview_limit)
        .expand_all(options.expand_all);
    for key in &options.expand {
        report_config = report_config.expand(key.clone());
    }

    if options.flat {
        let rows = workspace.catalog.aggregated(options.bom_code.as_deref());
        return output_report(config, ReportSubject::Flat(&rows), &report_config);
    }

    let mut groups = workspace.catalog.groups().context("Failed to group catalog")?;
    if let Some(code) = &options.bom_code {
        groups.retain(|key, _| key == code);
        if groups.is_empty() {
            anyhow::bail!("Unknown BOM code: {code}");
        }
    }
    let views = bom_groups(&groups, config.view.preview_limit);
    output_report(config, ReportSubject::Boms(&views), &report_config)
}

/// Make `version_tag` the version in force for `bom_code`.
pub fn run_activate(config: &AppConfig, bom_code: &str, version_tag: &str) -> Result<Activation> {
    let workspace = open_workspace(config)?;
    let activation = workspace
        .catalog
        .set_active_version(bom_code, version_tag)
        .with_context(|| format!("Failed to activate {bom_code}/{version_tag}"))?;
    if let Activation::Changed { previous } = &activation {
        workspace.save(&config.state.path)?;
        tracing::info!(
            "Activated {}/{} (was {})",
            bom_code,
            version_tag,
            previous.as_deref().unwrap_or("implicit")
        );
    } else {
        tracing::info!("{}/{} is already active", bom_code, version_tag);
    }
    Ok(activation)
}

/// Options of a version edit.
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub bom_code: String,
    /// Version to edit; the default version when absent
    pub version_tag: Option<String>,
    /// JSON array of material rows
    pub drafts: PathBuf,
}

/// Replace the rows of one version with an edited form, as one batch.
pub fn run_edit(config: &AppConfig, options: &EditOptions) -> Result<BatchReport> {
    let content = std::fs::read_to_string(&options.drafts)
        .with_context(|| format!("Failed to read {}", options.drafts.display()))?;
    let drafts: Vec<MaterialDraft> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse material rows: {}", options.drafts.display()))?;

    let mut workspace = open_workspace(config)?;
    let tag = normalize_version_tag(options.version_tag.as_deref());
    let original = workspace.catalog.version_items(&options.bom_code, &tag);
    let plan = plan_version_edit(
        &options.bom_code,
        Some(tag.as_str()),
        &original,
        drafts,
        workspace.catalog.upper_case_materials(),
    )?;
    if plan.is_empty() {
        tracing::info!("No changes to {}/{}", options.bom_code, tag);
        return Ok(BatchReport::default());
    }

    let report = workspace.catalog.apply_batch(plan)?;
    workspace.save(&config.state.path)?;
    Ok(report)
}

/// Copy a version (the active one when `source_tag` is `None`) to a new tag.
pub fn run_copy_version(
    config: &AppConfig,
    bom_code: &str,
    source_tag: Option<&str>,
    new_tag: &str,
) -> Result<Vec<u64>> {
    let mut workspace = open_workspace(config)?;
    let ids = workspace.catalog.copy_version(bom_code, source_tag, new_tag)?;
    workspace.save(&config.state.path)?;
    Ok(ids)
}

/// Delete one version of a BOM code.
pub fn run_delete_version(config: &AppConfig, bom_code: &str, version_tag: &str) -> Result<usize> {
    let mut workspace = open_workspace(config)?;
    let removed = workspace.catalog.delete_version(bom_code, version_tag)?;
    workspace.save(&config.state.path)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfigBuilder;
    use tempfile::TempDir;

    const ITEMS: &str = r#"[
        {"id": 1, "bomCode": "BC-01", "material": "cap-100", "qty": 5, "versionTag": "default"},
        {"id": 2, "bomCode": "BC-01", "material": "res-220", "qty": 2, "versionTag": "default"},
        {"id": 3, "bomCode": "BC-02", "material": "fuse-10a", "qty": 1}
    ]"#;

    fn setup() -> (TempDir, AppConfig) {
        let tmp = TempDir::new().unwrap();
        let config = AppConfigBuilder::default()
            .state_path(tmp.path().join("state.json"))
            .quiet(true)
            .build();
        let items = tmp.path().join("items.json");
        std::fs::write(&items, ITEMS).unwrap();
        run_import(&config, &items).unwrap();
        (tmp, config)
    }

    #[test]
    fn test_import_replaces_codes() {
        let (tmp, config) = setup();
        let items = tmp.path().join("items.json");
        let report = run_import(&config, &items).unwrap();
        assert_eq!(report.created.len(), 3);
        assert_eq!(report.deleted.len(), 3);

        let workspace = open_workspace(&config).unwrap();
        assert_eq!(workspace.catalog.len(), 3);
    }

    #[test]
    fn test_copy_activate_delete_version() {
        let (_tmp, config) = setup();
        let ids = run_copy_version(&config, "BC-01", None, "rev-b").unwrap();
        assert_eq!(ids.len(), 2);

        let activation = run_activate(&config, "BC-01", "rev-b").unwrap();
        assert_eq!(activation, Activation::Changed { previous: None });
        assert_eq!(run_activate(&config, "BC-01", "rev-b").unwrap(), Activation::Unchanged);

        let workspace = open_workspace(&config).unwrap();
        assert_eq!(workspace.catalog.active_version("BC-01").unwrap(), "rev-b");

        assert_eq!(run_delete_version(&config, "BC-01", "rev-b").unwrap(), 2);
        let workspace = open_workspace(&config).unwrap();
        assert_eq!(workspace.catalog.active_version("BC-01").unwrap(), "default");
    }

    #[test]
    fn test_edit_applies_one_batch() {
        let (tmp, config) = setup();
        let workspace = open_workspace(&config).unwrap();
        let original = workspace.catalog.version_items("BC-01", "default");
        let kept = original.iter().find(|i| i.material == "CAP-100").unwrap();

        let drafts = tmp.path().join("drafts.json");
        let rows = format!(
            r#"[{{"id": {}, "material": "CAP-100", "qty": 6}}, {{"material": "led-5", "qty": 4}}]"#,
            kept.id
        );
        std::fs::write(&drafts, rows).unwrap();

        let report = run_edit(
            &config,
            &EditOptions {
                bom_code: "BC-01".to_string(),
                version_tag: None,
                drafts,
            },
        )
        .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.updated, vec![kept.id]);
        assert_eq!(report.deleted.len(), 1);

        let workspace = open_workspace(&config).unwrap();
        let materials: Vec<String> = workspace
            .catalog
            .version_items("BC-01", "default")
            .into_iter()
            .map(|i| i.material)
            .collect();
        assert!(materials.contains(&"LED-5".to_string()));
        assert!(!materials.contains(&"RES-220".to_string()));
    }

    #[test]
    fn test_boms_unknown_code() {
        let (_tmp, config) = setup();
        let options = BomListOptions {
            bom_code: Some("NOPE".to_string()),
            ..BomListOptions::default()
        };
        assert!(run_boms(&config, &options).is_err());
    }
}
