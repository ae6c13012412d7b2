//! Reconciliation result structures.

use crate::actions::{FinalizeSelection, SelectedItem};
use crate::config::FinalizeConfig;
use crate::error::{BomReconError, Result};
use crate::model::TaskStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How a material with a nonzero difference is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Fewer observed than the BOM requires
    Shortage,
    /// More observed than the BOM requires
    Excess,
    /// Observed but absent from the BOM
    Unlisted,
}

impl Classification {
    /// Classify a material from its quantities. `None` means a perfect match.
    ///
    /// The checks are ordered: unlisted, then shortage, then excess.
    #[must_use]
    pub const fn from_quantities(bom_qty: i64, actual_qty: i64) -> Option<Self> {
        let difference = actual_qty - bom_qty;
        if bom_qty == 0 && actual_qty > 0 {
            Some(Self::Unlisted)
        } else if difference < 0 {
            Some(Self::Shortage)
        } else if difference > 0 && bom_qty > 0 {
            Some(Self::Excess)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shortage => "Shortage",
            Self::Excess => "Excess",
            Self::Unlisted => "Unlisted",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One material of the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareItemDetail {
    pub material: String,
    pub bom_qty: i64,
    pub actual_qty: i64,
    /// `actual_qty - bom_qty`
    pub difference: i64,
    pub classification: Classification,
    #[serde(default)]
    pub status: TaskStatus,
    /// Person in charge of the follow-up task
    #[serde(default)]
    pub pic: Option<String>,
    /// Viewpoints the material was observed in
    #[serde(default)]
    pub views: BTreeSet<String>,
}

impl CompareItemDetail {
    /// Missing amount for a shortage, zero otherwise.
    #[must_use]
    pub const fn missing(&self) -> i64 {
        match self.classification {
            Classification::Shortage => -self.difference,
            _ => 0,
        }
    }

    /// Surplus amount for excess and unlisted items, zero otherwise.
    #[must_use]
    pub const fn surplus(&self) -> i64 {
        match self.classification {
            Classification::Shortage => 0,
            _ => self.difference,
        }
    }
}

/// Task groups that share a status and PIC in the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskGroup {
    /// Shortage and excess items
    ShortageExcess,
    /// Unlisted items
    Unlisted,
}

impl TaskGroup {
    #[must_use]
    pub const fn contains(self, classification: Classification) -> bool {
        matches!(
            (self, classification),
            (Self::ShortageExcess, Classification::Shortage | Classification::Excess)
                | (Self::Unlisted, Classification::Unlisted)
        )
    }
}

/// Counts and totals of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// BOM line items considered
    pub bom_lines: usize,
    /// Distinct materials across both inputs
    pub materials: usize,
    /// Materials whose quantities match exactly
    pub matched: usize,
    pub shortages: usize,
    pub excesses: usize,
    pub unlisted: usize,
    /// Sum of missing quantities over shortages
    pub total_missing: i64,
    /// Sum of surplus quantities over excess and unlisted items
    pub total_surplus: i64,
}

impl ReconcileSummary {
    #[must_use]
    pub const fn findings(&self) -> usize {
        self.shortages + self.excesses + self.unlisted
    }
}

/// Complete result of reconciling one BOM version against an observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct ReconcileResult {
    pub bom_code: String,
    pub version_tag: String,
    /// Nonzero-difference materials in first-seen order
    pub items: Vec<CompareItemDetail>,
    pub summary: ReconcileSummary,
    /// xxh3 fingerprint of the inputs
    pub fingerprint: u64,
}

impl ReconcileResult {
    pub(crate) fn new(
        bom_code: impl Into<String>,
        version_tag: impl Into<String>,
        items: Vec<CompareItemDetail>,
        mut summary: ReconcileSummary,
        fingerprint: u64,
    ) -> Self {
        summary.shortages = 0;
        summary.excesses = 0;
        summary.unlisted = 0;
        summary.total_missing = 0;
        summary.total_surplus = 0;
        for item in &items {
            match item.classification {
                Classification::Shortage => summary.shortages += 1,
                Classification::Excess => summary.excesses += 1,
                Classification::Unlisted => summary.unlisted += 1,
            }
            summary.total_missing = summary.total_missing.saturating_add(item.missing());
            summary.total_surplus = summary.total_surplus.saturating_add(item.surplus());
        }
        Self {
            bom_code: bom_code.into(),
            version_tag: version_tag.into(),
            items,
            summary,
            fingerprint,
        }
    }

    /// Whether any material differs.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn shortages(&self) -> impl Iterator<Item = &CompareItemDetail> {
        self.by_class(Classification::Shortage)
    }

    pub fn excesses(&self) -> impl Iterator<Item = &CompareItemDetail> {
        self.by_class(Classification::Excess)
    }

    pub fn unlisted(&self) -> impl Iterator<Item = &CompareItemDetail> {
        self.by_class(Classification::Unlisted)
    }

    fn by_class(&self, class: Classification) -> impl Iterator<Item = &CompareItemDetail> {
        self.items.iter().filter(move |i| i.classification == class)
    }

    #[must_use]
    pub fn find(&self, material: &str) -> Option<&CompareItemDetail> {
        self.items.iter().find(|i| i.material == material)
    }

    /// Fingerprint as 16 hex digits.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        format!("{:016x}", self.fingerprint)
    }

    /// Set the task status and PIC of one material.
    pub fn set_task(
        &mut self,
        material: &str,
        status: TaskStatus,
        pic: Option<&str>,
    ) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.material == material)
            .ok_or_else(|| {
                BomReconError::validation(format!("material {material} is not in the comparison"))
            })?;
        item.status = status;
        item.pic = pic.map(str::to_string);
        Ok(())
    }

    /// Apply one status and PIC to every item of a task group. Returns the
    /// number of items updated.
    pub fn set_group_task(
        &mut self,
        group: TaskGroup,
        status: TaskStatus,
        pic: Option<&str>,
    ) -> usize {
        let mut updated = 0;
        for item in self
            .items
            .iter_mut()
            .filter(|i| group.contains(i.classification))
        {
            item.status = status;
            item.pic = pic.map(str::to_string);
            updated += 1;
        }
        tracing::debug!(
            "Set {:?} task of {} items in {} to {}",
            group,
            updated,
            self.bom_code,
            status
        );
        updated
    }

    /// Default finalize selection: every shortage at its missing amount and
    /// every unlisted item at its found amount, as enabled by `config`.
    pub fn proposal(&self, config: &FinalizeConfig) -> FinalizeSelection {
        let pick = |item: &CompareItemDetail, qty: i64| SelectedItem {
            material: item.material.clone(),
            qty,
        };
        FinalizeSelection {
            shortages: if config.include_shortages {
                self.shortages().map(|i| pick(i, i.missing())).collect()
            } else {
                Vec::new()
            },
            unlisted: if config.include_unlisted {
                self.unlisted().map(|i| pick(i, i.surplus())).collect()
            } else {
                Vec::new()
            },
        }
    }
}
