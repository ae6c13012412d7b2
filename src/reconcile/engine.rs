//! Reconciliation engine implementation.

use super::result::{Classification, CompareItemDetail, ReconcileResult, ReconcileSummary};
use crate::catalog::BomCatalog;
use crate::config::ReconcileConfig;
use crate::error::{BomReconError, ErrorContext, Result};
use crate::model::{
    ActualPart, BomLineItem, Observation, TaskStatus, add_qty, normalize_material,
    normalize_version_tag, validate_qty,
};
use crate::utils::Fingerprinter;
use indexmap::IndexMap;
use std::collections::BTreeSet;

#[derive(Default)]
struct Tally {
    bom_qty: i64,
    actual_qty: i64,
    views: BTreeSet<String>,
}

/// Diffs an observation against the line items of one BOM version.
#[derive(Debug, Clone)]
pub struct ReconcileEngine {
    upper_case_materials: bool,
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileEngine {
    /// Create a new engine with material upper-casing enabled
    #[must_use]
    pub const fn new() -> Self {
        Self {
            upper_case_materials: true,
        }
    }

    #[must_use]
    pub const fn from_config(config: &ReconcileConfig) -> Self {
        Self {
            upper_case_materials: config.normalize_material_case,
        }
    }

    #[must_use]
    pub const fn with_material_case(mut self, upper_case: bool) -> Self {
        self.upper_case_materials = upper_case;
        self
    }

    /// Compare BOM quantities with observed quantities per material.
    ///
    /// Both inputs are summed per material, then every material of the union
    /// is classified once. Zero differences are omitted. Output follows
    /// first-seen order: BOM materials first, then materials only observed.
    pub fn reconcile(
        &self,
        bom_items: &[BomLineItem],
        actual_parts: &[ActualPart],
    ) -> Result<Vec<CompareItemDetail>> {
        Ok(self.compare(bom_items, actual_parts)?.0)
    }

    /// Reconcile and wrap the details with summary and fingerprint.
    pub fn reconcile_version(
        &self,
        bom_code: &str,
        version_tag: &str,
        bom_items: &[BomLineItem],
        actual_parts: &[ActualPart],
    ) -> Result<ReconcileResult> {
        let version_tag = normalize_version_tag(Some(version_tag));
        let (items, summary) = self
            .compare(bom_items, actual_parts)
            .with_context(|| format!("reconciling {bom_code}/{version_tag}"))?;
        let fingerprint = fingerprint(bom_code, &version_tag, bom_items, actual_parts);

        let result = ReconcileResult::new(bom_code, version_tag, items, summary, fingerprint);
        tracing::info!(
            "Reconciled {}/{}: {} shortages, {} excess, {} unlisted",
            result.bom_code,
            result.version_tag,
            result.summary.shortages,
            result.summary.excesses,
            result.summary.unlisted
        );
        Ok(result)
    }

    /// Reconcile an observation against the catalog.
    ///
    /// Uses the version the observation names, or the active version.
    pub fn reconcile_observation(
        &self,
        catalog: &BomCatalog,
        observation: &Observation,
    ) -> Result<ReconcileResult> {
        let code = observation.bom_code.as_str();
        let version = match observation.version_tag.as_deref() {
            Some(tag) => {
                let tag = normalize_version_tag(Some(tag));
                if catalog.version_items(code, &tag).is_empty() {
                    return Err(if catalog.bom_codes().contains(&code) {
                        BomReconError::invalid_version(code, tag)
                    } else {
                        BomReconError::unknown_bom(code)
                    });
                }
                tag
            }
            None => catalog.active_version(code)?,
        };
        let items = catalog.version_items(code, &version);
        self.reconcile_version(code, &version, &items, &observation.parts)
    }

    fn compare(
        &self,
        bom_items: &[BomLineItem],
        actual_parts: &[ActualPart],
    ) -> Result<(Vec<CompareItemDetail>, ReconcileSummary)> {
        let mut tallies: IndexMap<String, Tally> = IndexMap::new();

        for item in bom_items {
            let context = format!("BOM line item {} ({})", item.id, item.material);
            let qty = validate_qty(context.as_str(), item.qty)?;
            let key = normalize_material(&item.material, self.upper_case_materials);
            let tally = tallies.entry(key).or_default();
            tally.bom_qty = add_qty(context, tally.bom_qty, qty)?;
        }
        for part in actual_parts {
            let context = format!("observed part {}", part.material);
            let qty = validate_qty(context.as_str(), part.qty)?;
            let key = normalize_material(&part.material, self.upper_case_materials);
            let tally = tallies.entry(key).or_default();
            tally.actual_qty = add_qty(context, tally.actual_qty, qty)?;
            tally.views.extend(part.views.iter().cloned());
        }

        let summary = ReconcileSummary {
            bom_lines: bom_items.len(),
            materials: tallies.len(),
            matched: tallies
                .values()
                .filter(|t| t.bom_qty == t.actual_qty)
                .count(),
            ..ReconcileSummary::default()
        };

        let details = tallies
            .into_iter()
            .filter_map(|(material, tally)| {
                let classification =
                    Classification::from_quantities(tally.bom_qty, tally.actual_qty)?;
                Some(CompareItemDetail {
                    material,
                    bom_qty: tally.bom_qty,
                    actual_qty: tally.actual_qty,
                    difference: tally.actual_qty - tally.bom_qty,
                    classification,
                    status: TaskStatus::default(),
                    pic: None,
                    views: tally.views,
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Compared {} BOM lines with {} observed parts: {} findings",
            bom_items.len(),
            actual_parts.len(),
            details.len()
        );
        Ok((details, summary))
    }
}

fn fingerprint(
    bom_code: &str,
    version_tag: &str,
    bom_items: &[BomLineItem],
    parts: &[ActualPart],
) -> u64 {
    let mut fp = Fingerprinter::new();
    fp.str(bom_code).str(version_tag).section();
    for item in bom_items {
        fp.str(&item.material).int(item.qty);
    }
    fp.section();
    for part in parts {
        fp.str(&part.material).int(part.qty);
    }
    fp.finish()
}
