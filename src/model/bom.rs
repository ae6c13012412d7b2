//! BOM line items, version groups and flat aggregated rows.

use crate::error::{BomReconError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Implicit version tag for line items created without one.
pub const DEFAULT_VERSION: &str = "default";

/// Normalize a version tag: blank or absent becomes [`DEFAULT_VERSION`].
///
/// This is the only place the implicit tag is applied; consumers always see
/// a non-empty tag.
#[must_use]
pub fn normalize_version_tag(tag: Option<&str>) -> String {
    match tag.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => DEFAULT_VERSION.to_string(),
    }
}

/// Normalize a material name: trimmed, optionally upper-cased.
#[must_use]
pub fn normalize_material(name: &str, upper_case: bool) -> String {
    let trimmed = name.trim();
    if upper_case {
        trimmed.to_uppercase()
    } else {
        trimmed.to_string()
    }
}

/// Reject quantities that are not strictly positive.
pub fn validate_qty(context: impl Into<String>, qty: i64) -> Result<i64> {
    if qty > 0 {
        Ok(qty)
    } else {
        Err(BomReconError::invalid_quantity(context, qty))
    }
}

/// Add `qty` to a running total, rejecting sums that leave the `i64` range.
pub fn add_qty(context: impl Into<String>, total: i64, qty: i64) -> Result<i64> {
    total.checked_add(qty).ok_or_else(|| {
        BomReconError::invalid_quantity(context, format!("{total} + {qty} overflows"))
    })
}

/// A single expected part of a BOM version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomLineItem {
    pub id: u64,
    pub bom_code: String,
    pub version_tag: String,
    pub part_reference: String,
    /// Material code, also used as the part name
    pub material: String,
    #[serde(default)]
    pub description: String,
    pub qty: i64,
}

impl BomLineItem {
    /// Check the catalog-level constraints of a stored line item.
    pub fn validate(&self) -> Result<()> {
        if self.bom_code.trim().is_empty() {
            return Err(BomReconError::validation(format!(
                "line item {} has a blank BOM code",
                self.id
            )));
        }
        if self.material.trim().is_empty() {
            return Err(BomReconError::validation(format!(
                "line item {} has a blank material",
                self.id
            )));
        }
        validate_qty(format!("line item {} ({})", self.id, self.material), self.qty)?;
        Ok(())
    }

    /// Catalog key `(bomCode, versionTag, id)`.
    #[must_use]
    pub fn catalog_key(&self) -> (&str, &str, u64) {
        (&self.bom_code, &self.version_tag, self.id)
    }
}

/// Input for a line item that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub bom_code: String,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub part_reference: String,
    pub material: String,
    #[serde(default)]
    pub description: String,
    pub qty: i64,
}

impl NewLineItem {
    pub fn new(bom_code: impl Into<String>, material: impl Into<String>, qty: i64) -> Self {
        Self {
            bom_code: bom_code.into(),
            version_tag: None,
            part_reference: String::new(),
            material: material.into(),
            description: String::new(),
            qty,
        }
    }

    #[must_use]
    pub fn version(mut self, tag: impl Into<String>) -> Self {
        self.version_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn part_reference(mut self, reference: impl Into<String>) -> Self {
        self.part_reference = reference.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Validate and normalize into a stored line item with the given id.
    pub fn into_line_item(self, id: u64, upper_case: bool) -> Result<BomLineItem> {
        let item = BomLineItem {
            id,
            bom_code: self.bom_code.trim().to_string(),
            version_tag: normalize_version_tag(self.version_tag.as_deref()),
            part_reference: self.part_reference.trim().to_string(),
            material: normalize_material(&self.material, upper_case),
            description: self.description.trim().to_string(),
            qty: self.qty,
        };
        item.validate()?;
        Ok(item)
    }
}

/// All versions of one BOM code, with the version currently in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomVersionGroup {
    pub bom_code: String,
    pub active_version: String,
    /// Version tag -> line items, in first-seen order
    pub versions: IndexMap<String, Vec<BomLineItem>>,
}

impl BomVersionGroup {
    /// Line items of the active version.
    #[must_use]
    pub fn active_items(&self) -> &[BomLineItem] {
        self.versions
            .get(&self.active_version)
            .map_or(&[], Vec::as_slice)
    }

    pub fn version_tags(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains_version(&self, tag: &str) -> bool {
        self.versions.contains_key(tag)
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.versions.values().map(Vec::len).sum()
    }

    /// Verify `active_version` names a version with at least one item.
    pub fn check_invariant(&self) -> Result<()> {
        if self.versions.is_empty() {
            return Ok(());
        }
        match self.versions.get(&self.active_version) {
            Some(items) if !items.is_empty() => Ok(()),
            _ => Err(BomReconError::invariant(format!(
                "active version '{}' of BOM {} has no line items",
                self.active_version, self.bom_code
            ))),
        }
    }
}

/// One row of the flat (non-versioned) BOM listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedBomRow {
    pub bom_code: String,
    pub part_reference: String,
    pub part_name: String,
    pub description: String,
    pub qty: i64,
}

impl AggregatedBomRow {
    /// Display label `bomCode|partReference|partName`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.bom_code, self.part_reference, self.part_name)
    }
}

impl From<&BomLineItem> for AggregatedBomRow {
    fn from(item: &BomLineItem) -> Self {
        Self {
            bom_code: item.bom_code.clone(),
            part_reference: item.part_reference.clone(),
            part_name: item.material.clone(),
            description: item.description.clone(),
            qty: item.qty,
        }
    }
}

impl From<&AggregatedBomRow> for AggregatedBomRow {
    fn from(row: &AggregatedBomRow) -> Self {
        row.clone()
    }
}
