//! Grouped views of BOMs and action items.

use super::grouped::{GroupedRow, Preview, group, preview_where, rollup_sum};
use crate::model::{ActionItem, ActionItemType, BomLineItem, BomVersionGroup};
use indexmap::IndexMap;
use serde::Serialize;

/// One parent row of the BOM table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BomGroupView {
    pub bom_code: String,
    pub active_version: String,
    pub versions: Vec<String>,
    /// Line items of the active version
    pub line_count: usize,
    /// Summed quantity of the active version
    pub total_qty: i64,
    pub materials: Preview<String>,
    pub tree: GroupedRow<BomLineItem>,
}

/// Build the BOM table: one group per BOM code holding its active items.
#[must_use]
pub fn bom_groups(
    groups: &IndexMap<String, BomVersionGroup>,
    preview_limit: usize,
) -> Vec<BomGroupView> {
    let rows = groups.values().flat_map(|g| g.active_items().iter().cloned());
    group(rows, |item: &BomLineItem| item.bom_code.clone())
        .into_iter()
        .filter_map(|node| {
            let version_group = groups.get(&node.key)?;
            let items: Vec<&BomLineItem> = node.leaf_rows();
            let materials = preview_where(&items, preview_limit, |_| true);
            Some(BomGroupView {
                bom_code: node.key.clone(),
                active_version: version_group.active_version.clone(),
                versions: version_group.version_tags().map(str::to_string).collect(),
                line_count: node.leaf_count(),
                total_qty: rollup_sum(&node.children, |item| item.qty),
                materials: Preview {
                    visible: materials.visible.iter().map(|i| i.material.clone()).collect(),
                    remaining: materials.remaining,
                },
                tree: node,
            })
        })
        .collect()
}

/// One parent row of the action item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionGroupView {
    pub bom_code: String,
    pub count: usize,
    /// Items not yet `SELESAI`
    pub open: usize,
    pub latest_batch: u32,
    pub shortages: Preview<String>,
    pub unlisted: Preview<String>,
    pub tree: GroupedRow<ActionItem>,
}

impl ActionGroupView {
    /// Parent label, e.g. `BC-01 (3)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.bom_code, self.count)
    }
}

/// Group action items per BOM code with shortage and unlisted chips.
#[must_use]
pub fn action_groups(items: &[ActionItem], preview_limit: usize) -> Vec<ActionGroupView> {
    group(items.iter().cloned(), |item: &ActionItem| item.bom_code.clone())
        .into_iter()
        .map(|node| {
            let rows: Vec<&ActionItem> = node.leaf_rows();
            let chips = |kind: ActionItemType| {
                let preview = preview_where(&rows, preview_limit, |i| i.item_type == kind);
                Preview {
                    visible: preview
                        .visible
                        .iter()
                        .map(|i| format!("{} ({:+})", i.part_name, i.quantity_diff))
                        .collect(),
                    remaining: preview.remaining,
                }
            };
            ActionGroupView {
                bom_code: node.key.clone(),
                count: rows.len(),
                open: rows.iter().filter(|i| !i.is_resolved()).count(),
                latest_batch: rows.iter().map(|i| i.batch).max().unwrap_or(0),
                shortages: chips(ActionItemType::Shortage),
                unlisted: chips(ActionItemType::Unlisted),
                tree: node,
            }
        })
        .collect()
}
