//! Action item ledger and the finalize/status/reset operations.

use crate::error::{BomReconError, Result};
use crate::model::{ActionItem, ActionItemStatus, ActionItemType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;

/// A reviewed finding chosen for follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub material: String,
    pub qty: i64,
}

impl SelectedItem {
    pub fn new(material: impl Into<String>, qty: i64) -> Self {
        Self {
            material: material.into(),
            qty,
        }
    }
}

/// Findings the reviewer committed to, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeSelection {
    #[serde(default)]
    pub shortages: Vec<SelectedItem>,
    #[serde(default)]
    pub unlisted: Vec<SelectedItem>,
}

impl FinalizeSelection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.shortages.len() + self.unlisted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shortages.is_empty() && self.unlisted.is_empty()
    }

    /// Drop a material from both lists.
    pub fn deselect(&mut self, material: &str) {
        self.shortages.retain(|s| s.material != material);
        self.unlisted.retain(|s| s.material != material);
    }

    fn validate(&self, bom_code: &str) -> Result<()> {
        for (kind, list) in [("shortage", &self.shortages), ("unlisted", &self.unlisted)] {
            let mut seen = HashSet::new();
            for item in list {
                if item.material.trim().is_empty() {
                    return Err(BomReconError::validation(format!(
                        "{kind} selection for {bom_code} has a blank material"
                    )));
                }
                if item.qty <= 0 {
                    return Err(BomReconError::invalid_quantity(
                        format!("{kind} {} of {bom_code}", item.material),
                        item.qty,
                    ));
                }
                if !seen.insert(item.material.as_str()) {
                    return Err(BomReconError::validation(format!(
                        "{kind} {} selected twice for {bom_code}",
                        item.material
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Record of one finalize commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeBatch {
    pub bom_code: String,
    /// 1-based, per BOM code
    pub batch: u32,
    /// Fingerprint of the reconciliation the selection came from
    #[serde(default)]
    pub fingerprint: Option<u64>,
    pub item_ids: Vec<u64>,
    pub created_at: DateTime<Utc>,
}

/// Persistable contents of the deriver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLedger {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub items: Vec<ActionItem>,
    #[serde(default)]
    pub batches: Vec<FinalizeBatch>,
}

impl ActionLedger {
    fn last_batch(&self, bom_code: &str) -> u32 {
        self.batches
            .iter()
            .filter(|b| b.bom_code == bom_code)
            .map(|b| b.batch)
            .max()
            .unwrap_or(0)
    }

    fn allocate_id(&mut self) -> u64 {
        let floor = self.items.iter().map(|i| i.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(floor) + 1;
        self.next_id
    }
}

/// Turns finalized selections into action items and tracks their workflow.
///
/// The ledger sits behind one `RwLock`; finalize and reset are each a single
/// write section, so they apply fully or not at all.
#[derive(Debug, Default)]
pub struct ActionItemDeriver {
    ledger: RwLock<ActionLedger>,
}

impl ActionItemDeriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_ledger(ledger: ActionLedger) -> Self {
        Self {
            ledger: RwLock::new(ledger),
        }
    }

    /// Copy of the ledger, for persistence.
    #[must_use]
    pub fn snapshot(&self) -> ActionLedger {
        self.ledger.read().expect("action ledger lock poisoned").clone()
    }

    /// Commit a selection as a new batch of `BARU_MASUK` items.
    ///
    /// Rejected with `AlreadyFinalized` while any earlier item of the BOM
    /// code is unresolved. An empty selection creates nothing.
    pub fn finalize(
        &self,
        bom_code: &str,
        selection: &FinalizeSelection,
        fingerprint: Option<u64>,
    ) -> Result<Vec<ActionItem>> {
        self.finalize_at(bom_code, selection, fingerprint, Utc::now())
    }

    pub(crate) fn finalize_at(
        &self,
        bom_code: &str,
        selection: &FinalizeSelection,
        fingerprint: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionItem>> {
        if bom_code.trim().is_empty() {
            return Err(BomReconError::validation("finalize requires a BOM code"));
        }
        selection.validate(bom_code)?;

        let mut ledger = self.ledger.write().expect("action ledger lock poisoned");
        let unresolved = ledger
            .items
            .iter()
            .filter(|i| i.bom_code == bom_code && !i.is_resolved())
            .count();
        if unresolved > 0 {
            let batch = ledger.last_batch(bom_code);
            tracing::warn!(
                "Refusing to finalize {}: batch #{} has {} unresolved items",
                bom_code,
                batch,
                unresolved
            );
            return Err(BomReconError::AlreadyFinalized {
                bom_code: bom_code.to_string(),
                batch,
                unresolved,
            });
        }
        if selection.is_empty() {
            tracing::debug!("Nothing selected for {}", bom_code);
            return Ok(Vec::new());
        }

        let batch = ledger.last_batch(bom_code) + 1;
        let selected = selection
            .shortages
            .iter()
            .map(|s| (s, ActionItemType::Shortage, -s.qty))
            .chain(
                selection
                    .unlisted
                    .iter()
                    .map(|s| (s, ActionItemType::Unlisted, s.qty)),
            );

        let mut created = Vec::with_capacity(selection.len());
        for (item, item_type, quantity_diff) in selected {
            let id = ledger.allocate_id();
            created.push(ActionItem {
                id,
                bom_code: bom_code.to_string(),
                part_name: item.material.trim().to_string(),
                item_type,
                quantity_diff,
                status: ActionItemStatus::BaruMasuk,
                batch,
                created_at: now,
                updated_at: now,
            });
        }

        ledger.items.extend(created.iter().cloned());
        ledger.batches.push(FinalizeBatch {
            bom_code: bom_code.to_string(),
            batch,
            fingerprint,
            item_ids: created.iter().map(|i| i.id).collect(),
            created_at: now,
        });
        tracing::info!(
            "Finalized {} batch #{}: {} action items",
            bom_code,
            batch,
            created.len()
        );
        Ok(created)
    }

    /// Move an action item along the status workflow.
    ///
    /// Re-applying the current status is a no-op.
    pub fn update_status(&self, id: u64, status: ActionItemStatus) -> Result<ActionItem> {
        self.update_status_at(id, status, Utc::now())
    }

    pub(crate) fn update_status_at(
        &self,
        id: u64,
        status: ActionItemStatus,
        now: DateTime<Utc>,
    ) -> Result<ActionItem> {
        let mut ledger = self.ledger.write().expect("action ledger lock poisoned");
        let item = ledger
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(BomReconError::UnknownActionItem(id))?;

        if item.status == status {
            return Ok(item.clone());
        }
        if !item.status.can_transition_to(status) {
            return Err(BomReconError::InvalidTransition {
                id,
                from: item.status.to_string(),
                to: status.to_string(),
            });
        }
        tracing::info!("Action item {} {} -> {}", id, item.status, status);
        item.status = status;
        item.updated_at = now;
        Ok(item.clone())
    }

    /// Delete every action item and batch record of a BOM code. Returns the
    /// number of items removed.
    pub fn reset(&self, bom_code: &str) -> usize {
        let mut ledger = self.ledger.write().expect("action ledger lock poisoned");
        let before = ledger.items.len();
        ledger.items.retain(|i| i.bom_code != bom_code);
        ledger.batches.retain(|b| b.bom_code != bom_code);
        let removed = before - ledger.items.len();
        tracing::info!("Reset {}: removed {} action items", bom_code, removed);
        removed
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<ActionItem> {
        self.ledger
            .read()
            .expect("action ledger lock poisoned")
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    /// All action items in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<ActionItem> {
        self.ledger
            .read()
            .expect("action ledger lock poisoned")
            .items
            .clone()
    }

    #[must_use]
    pub fn list_for(&self, bom_code: &str) -> Vec<ActionItem> {
        self.ledger
            .read()
            .expect("action ledger lock poisoned")
            .items
            .iter()
            .filter(|i| i.bom_code == bom_code)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn batches_for(&self, bom_code: &str) -> Vec<FinalizeBatch> {
        self.ledger
            .read()
            .expect("action ledger lock poisoned")
            .batches
            .iter()
            .filter(|b| b.bom_code == bom_code)
            .cloned()
            .collect()
    }
}
