//! JSON workspace snapshot shared by CLI invocations.
//!
//! The snapshot holds the catalog line items, the explicit active-version
//! pointers and the action ledger. It is written to a sibling temp file and
//! renamed over the target, so a crash never leaves a half-written file.

use crate::actions::{ActionItemDeriver, ActionLedger};
use crate::catalog::{BatchPlan, BatchReport, BomCatalog};
use crate::model::{BomLineItem, NewLineItem};
use anyhow::{Context, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Current snapshot format version.
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Serialized form of a [`Workspace`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceState {
    #[serde(default)]
    pub format_version: u32,
    #[serde(default)]
    pub items: Vec<BomLineItem>,
    /// BOM code -> explicitly activated version tag
    #[serde(default)]
    pub active_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub actions: ActionLedger,
}

/// Catalog and action ledger loaded from one snapshot.
#[derive(Debug, Default)]
pub struct Workspace {
    pub catalog: BomCatalog,
    pub actions: ActionItemDeriver,
}

impl Workspace {
    /// Empty workspace.
    #[must_use]
    pub fn new(upper_case_materials: bool) -> Self {
        Self {
            catalog: BomCatalog::new().with_material_case(upper_case_materials),
            actions: ActionItemDeriver::new(),
        }
    }

    /// Rebuild from a snapshot, checking every catalog invariant.
    pub fn from_state(state: WorkspaceState, upper_case_materials: bool) -> Result<Self> {
        if state.format_version > STATE_FORMAT_VERSION {
            anyhow::bail!(
                "workspace snapshot format {} is newer than supported format {}",
                state.format_version,
                STATE_FORMAT_VERSION
            );
        }
        let catalog = BomCatalog::restore(state.items, state.active_versions)
            .context("workspace snapshot is inconsistent")?
            .with_material_case(upper_case_materials);
        Ok(Self {
            catalog,
            actions: ActionItemDeriver::from_ledger(state.actions),
        })
    }

    /// Snapshot of the current contents.
    #[must_use]
    pub fn to_state(&self) -> WorkspaceState {
        WorkspaceState {
            format_version: STATE_FORMAT_VERSION,
            items: self.catalog.items().cloned().collect(),
            active_versions: self.catalog.active_snapshot(),
            actions: self.actions.snapshot(),
        }
    }

    /// Load a snapshot; a missing file yields an empty workspace.
    pub fn load(path: &Path, upper_case_materials: bool) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No workspace snapshot at {}, starting empty", path.display());
            return Ok(Self::new(upper_case_materials));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workspace snapshot: {}", path.display()))?;
        let state: WorkspaceState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse workspace snapshot: {}", path.display()))?;
        let workspace = Self::from_state(state, upper_case_materials)
            .with_context(|| format!("Failed to restore workspace: {}", path.display()))?;
        tracing::debug!(
            "Loaded workspace with {} line items from {}",
            workspace.catalog.len(),
            path.display()
        );
        Ok(workspace)
    }

    /// Write the snapshot atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_state())
            .context("Failed to serialize workspace snapshot")?;
        write_atomic(path, &json)
            .with_context(|| format!("Failed to replace workspace snapshot: {}", path.display()))?;
        tracing::debug!("Saved workspace snapshot to {}", path.display());
        Ok(())
    }

    /// Replace every line item of the BOM codes present in `items`.
    ///
    /// Runs as one catalog batch, so either every code is replaced or the
    /// catalog is left untouched. Ids are reassigned by the catalog.
    pub fn import_items(&mut self, items: Vec<BomLineItem>) -> Result<BatchReport> {
        let codes: IndexSet<String> = items.iter().map(|i| i.bom_code.clone()).collect();
        let mut plan = BatchPlan::new();
        for item in self.catalog.items() {
            if codes.contains(&item.bom_code) {
                plan = plan.delete(item.id);
            }
        }
        for item in items {
            plan = plan.create(NewLineItem {
                bom_code: item.bom_code,
                version_tag: Some(item.version_tag),
                part_reference: item.part_reference,
                material: item.material,
                description: item.description,
                qty: item.qty,
            });
        }
        let report = self.catalog.apply_batch(plan).context("importing line items")?;
        tracing::info!(
            "Imported {} line items for {} BOMs",
            report.created.len(),
            codes.len()
        );
        Ok(report)
    }
}

/// Write `contents` to a sibling temp file and rename it over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename {}", tmp_path.display()))?;
    Ok(())
}
