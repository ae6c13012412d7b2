//! In-memory BOM catalog.

use super::batch::{BatchOp, BatchPlan, BatchReport};
use super::grouping::{aggregate_flat, group_by_version_with};
use super::versions::{Activation, VersionResolver, VersionSource};
use crate::error::{BomReconError, ErrorContext, Result};
use crate::model::{
    AggregatedBomRow, BomLineItem, BomVersionGroup, NewLineItem, normalize_version_tag,
};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Filter for [`BomCatalog::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub bom_code: Option<String>,
    pub version_tag: Option<String>,
}

impl CatalogFilter {
    #[must_use]
    pub fn bom(bom_code: impl Into<String>) -> Self {
        Self {
            bom_code: Some(bom_code.into()),
            version_tag: None,
        }
    }

    #[must_use]
    pub fn version(mut self, tag: &str) -> Self {
        self.version_tag = Some(normalize_version_tag(Some(tag)));
        self
    }

    fn matches(&self, item: &BomLineItem) -> bool {
        self.bom_code.as_ref().is_none_or(|c| *c == item.bom_code)
            && self.version_tag.as_ref().is_none_or(|t| *t == item.version_tag)
    }
}

/// Owns the raw line items and the active-version pointers.
///
/// Mutations take `&mut self`; activation only needs `&self` and is
/// serialized by the resolver.
#[derive(Debug)]
pub struct BomCatalog {
    items: IndexMap<u64, BomLineItem>,
    next_id: u64,
    versions: VersionResolver,
    upper_case_materials: bool,
}

impl Default for BomCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionSource for BomCatalog {
    fn has_bom(&self, bom_code: &str) -> bool {
        self.items.values().any(|i| i.bom_code == bom_code)
    }

    fn version_item_count(&self, bom_code: &str, version_tag: &str) -> usize {
        self.items
            .values()
            .filter(|i| i.bom_code == bom_code && i.version_tag == version_tag)
            .count()
    }

    fn first_version(&self, bom_code: &str) -> Option<String> {
        self.items
            .values()
            .find(|i| i.bom_code == bom_code)
            .map(|i| i.version_tag.clone())
    }
}

impl BomCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
            next_id: 1,
            versions: VersionResolver::new(),
            upper_case_materials: true,
        }
    }

    /// Toggle upper-casing of material names at ingestion.
    #[must_use]
    pub const fn with_material_case(mut self, upper_case: bool) -> Self {
        self.upper_case_materials = upper_case;
        self
    }

    /// Rebuild a catalog from stored items and explicit activations.
    ///
    /// Every item is validated, ids must be unique, and every activation
    /// must point at a version with items.
    pub fn restore(
        items: Vec<BomLineItem>,
        active: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut catalog = Self::new();
        for mut item in items {
            item.version_tag = normalize_version_tag(Some(&item.version_tag));
            item.validate().context("restoring catalog")?;
            if catalog.items.contains_key(&item.id) {
                return Err(BomReconError::invariant(format!(
                    "duplicate line item id {}",
                    item.id
                )));
            }
            catalog.next_id = catalog.next_id.max(item.id + 1);
            catalog.items.insert(item.id, item);
        }

        catalog.versions = VersionResolver::from_map(active);
        for (code, tag) in catalog.versions.snapshot() {
            if catalog.version_item_count(&code, &tag) == 0 {
                return Err(BomReconError::invariant(format!(
                    "active version '{tag}' of BOM {code} has no line items"
                )));
            }
        }
        tracing::debug!("Restored catalog with {} line items", catalog.items.len());
        Ok(catalog)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&BomLineItem> {
        self.items.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &BomLineItem> {
        self.items.values()
    }

    #[must_use]
    pub const fn resolver(&self) -> &VersionResolver {
        &self.versions
    }

    #[must_use]
    pub const fn upper_case_materials(&self) -> bool {
        self.upper_case_materials
    }

    /// Line items matching `filter`, in insertion order.
    #[must_use]
    pub fn list(&self, filter: &CatalogFilter) -> Vec<&BomLineItem> {
        self.items.values().filter(|i| filter.matches(i)).collect()
    }

    /// BOM codes in first-seen order.
    #[must_use]
    pub fn bom_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        for item in self.items.values() {
            if !codes.contains(&item.bom_code.as_str()) {
                codes.push(&item.bom_code);
            }
        }
        codes
    }

    /// Version tags of a BOM code in first-seen order.
    #[must_use]
    pub fn version_tags(&self, bom_code: &str) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for item in self.items.values().filter(|i| i.bom_code == bom_code) {
            if !tags.contains(&item.version_tag.as_str()) {
                tags.push(&item.version_tag);
            }
        }
        tags
    }

    /// Line items of one version.
    #[must_use]
    pub fn version_items(&self, bom_code: &str, version_tag: &str) -> Vec<BomLineItem> {
        let tag = normalize_version_tag(Some(version_tag));
        self.items
            .values()
            .filter(|i| i.bom_code == bom_code && i.version_tag == tag)
            .cloned()
            .collect()
    }

    /// The version in force for a BOM code.
    pub fn active_version(&self, bom_code: &str) -> Result<String> {
        self.versions.get_active_version(self, bom_code)
    }

    /// Line items of the version in force.
    pub fn active_items(&self, bom_code: &str) -> Result<Vec<BomLineItem>> {
        let tag = self.active_version(bom_code)?;
        Ok(self.version_items(bom_code, &tag))
    }

    pub fn set_active_version(&self, bom_code: &str, version_tag: &str) -> Result<Activation> {
        self.versions.set_active_version(self, bom_code, version_tag)
    }

    /// All BOM codes folded into version groups.
    pub fn groups(&self) -> Result<IndexMap<String, BomVersionGroup>> {
        let items: Vec<BomLineItem> = self.items.values().cloned().collect();
        group_by_version_with(&items, &self.versions)
    }

    /// Flat listing, optionally restricted to one BOM code.
    #[must_use]
    pub fn aggregated(&self, bom_code: Option<&str>) -> Vec<AggregatedBomRow> {
        aggregate_flat(
            self.items
                .values()
                .filter(|i| bom_code.is_none_or(|c| c == i.bom_code)),
        )
    }

    /// Store a new line item and return its id.
    pub fn insert(&mut self, item: NewLineItem) -> Result<u64> {
        let id = self.next_id;
        let item = item.into_line_item(id, self.upper_case_materials)?;
        self.next_id += 1;
        tracing::debug!(
            "Inserted line item {} into {}/{}",
            id,
            item.bom_code,
            item.version_tag
        );
        self.items.insert(id, item);
        Ok(id)
    }

    /// Replace the content of a stored line item.
    pub fn update(&mut self, id: u64, item: NewLineItem) -> Result<()> {
        let Some(previous) = self.items.get(&id) else {
            return Err(BomReconError::validation(format!("unknown line item {id}")));
        };
        let (code, tag) = (previous.bom_code.clone(), previous.version_tag.clone());
        let item = item.into_line_item(id, self.upper_case_materials)?;
        self.items.insert(id, item);
        self.release_empty_active(&code, &tag);
        Ok(())
    }

    /// Remove a line item.
    pub fn remove(&mut self, id: u64) -> Result<BomLineItem> {
        let item = self
            .items
            .shift_remove(&id)
            .ok_or_else(|| BomReconError::validation(format!("unknown line item {id}")))?;
        self.release_empty_active(&item.bom_code, &item.version_tag);
        Ok(item)
    }

    /// Create `new_tag` for a BOM code by copying the items of `source_tag`
    /// (the active version when `None`). Returns the new ids.
    pub fn copy_version(
        &mut self,
        bom_code: &str,
        source_tag: Option<&str>,
        new_tag: &str,
    ) -> Result<Vec<u64>> {
        let new_tag = normalize_version_tag(Some(new_tag));
        let source_tag = match source_tag {
            Some(tag) => normalize_version_tag(Some(tag)),
            None => self.active_version(bom_code)?,
        };
        let source = self.version_items(bom_code, &source_tag);
        if source.is_empty() {
            return Err(BomReconError::invalid_version(bom_code, source_tag));
        }
        if self.version_item_count(bom_code, &new_tag) > 0 {
            return Err(BomReconError::validation(format!(
                "BOM {bom_code} already has a version '{new_tag}'"
            )));
        }

        let mut ids = Vec::with_capacity(source.len());
        for mut item in source {
            item.id = self.next_id;
            item.version_tag.clone_from(&new_tag);
            self.next_id += 1;
            ids.push(item.id);
            self.items.insert(item.id, item);
        }
        tracing::info!(
            "Created version '{}' of BOM {} from '{}' ({} items)",
            new_tag,
            bom_code,
            source_tag,
            ids.len()
        );
        Ok(ids)
    }

    /// Delete every item of one version. Returns the number removed.
    pub fn delete_version(&mut self, bom_code: &str, version_tag: &str) -> Result<usize> {
        let tag = normalize_version_tag(Some(version_tag));
        if !self.has_bom(bom_code) {
            return Err(BomReconError::unknown_bom(bom_code));
        }
        let before = self.items.len();
        self.items
            .retain(|_, i| !(i.bom_code == bom_code && i.version_tag == tag));
        let removed = before - self.items.len();
        if removed == 0 {
            return Err(BomReconError::invalid_version(bom_code, tag));
        }
        self.versions.clear_if(bom_code, &tag);
        tracing::info!("Deleted version '{}' of BOM {} ({} items)", tag, bom_code, removed);
        Ok(removed)
    }

    /// Delete every item of a BOM code. Returns the number removed.
    pub fn delete_bom(&mut self, bom_code: &str) -> Result<usize> {
        let before = self.items.len();
        self.items.retain(|_, i| i.bom_code != bom_code);
        let removed = before - self.items.len();
        if removed == 0 {
            return Err(BomReconError::unknown_bom(bom_code));
        }
        self.versions.clear(bom_code);
        tracing::info!("Deleted BOM {} ({} items)", bom_code, removed);
        Ok(removed)
    }

    /// Apply a batch all-or-nothing.
    ///
    /// Operations run against a staged copy; if any fails the catalog is
    /// left untouched and `PartialBatchFailure` lists the failed keys.
    pub fn apply_batch(&mut self, plan: BatchPlan) -> Result<BatchReport> {
        let total = plan.len();
        let mut staged = self.items.clone();
        let mut next_id = self.next_id;
        let mut report = BatchReport::default();
        let mut failed_keys = Vec::new();
        let mut touched: Vec<(String, String)> = Vec::new();

        for op in plan.ops {
            let key = op.key();
            let outcome = match op {
                BatchOp::Create { item } => item
                    .into_line_item(next_id, self.upper_case_materials)
                    .map(|item| {
                        report.created.push(item.id);
                        staged.insert(item.id, item);
                        next_id += 1;
                    }),
                BatchOp::Update { id, item } => match staged.get(&id) {
                    Some(previous) => {
                        touched.push((previous.bom_code.clone(), previous.version_tag.clone()));
                        item.into_line_item(id, self.upper_case_materials).map(|item| {
                            report.updated.push(id);
                            staged.insert(id, item);
                        })
                    }
                    None => Err(BomReconError::validation(format!("unknown line item {id}"))),
                },
                BatchOp::Delete { id } => match staged.shift_remove(&id) {
                    Some(previous) => {
                        touched.push((previous.bom_code, previous.version_tag));
                        report.deleted.push(id);
                        Ok(())
                    }
                    None => Err(BomReconError::validation(format!("unknown line item {id}"))),
                },
            };
            if let Err(err) = outcome {
                tracing::debug!("Batch operation {} failed: {}", key, err);
                failed_keys.push(key);
            }
        }

        if !failed_keys.is_empty() {
            tracing::warn!(
                "Batch rejected: {} of {} operations failed",
                failed_keys.len(),
                total
            );
            return Err(BomReconError::PartialBatchFailure {
                failed: failed_keys.len(),
                total,
                failed_keys,
            });
        }

        self.items = staged;
        self.next_id = next_id;
        for (code, tag) in touched {
            self.release_empty_active(&code, &tag);
        }
        tracing::info!(
            "Applied batch: {} created, {} updated, {} deleted",
            report.created.len(),
            report.updated.len(),
            report.deleted.len()
        );
        Ok(report)
    }

    /// Explicit activations, for persistence.
    #[must_use]
    pub fn active_snapshot(&self) -> BTreeMap<String, String> {
        self.versions.snapshot()
    }

    /// Drop an explicit activation whose version lost its last item.
    fn release_empty_active(&self, bom_code: &str, version_tag: &str) {
        if self.version_item_count(bom_code, version_tag) == 0 {
            self.versions.clear_if(bom_code, version_tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> BomCatalog {
        let mut catalog = BomCatalog::new();
        catalog
            .insert(NewLineItem::new("BC-01", "CAP-100", 5).part_reference("C1"))
            .unwrap();
        catalog
            .insert(NewLineItem::new("BC-01", "RES-220", 3).part_reference("R1"))
            .unwrap();
        catalog
            .insert(NewLineItem::new("BC-01", "cap-100", 4).version("rev-b"))
            .unwrap();
        catalog
    }

    #[test]
    fn test_insert_normalizes() {
        let catalog = seeded();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(3).unwrap().material, "CAP-100");
        assert_eq!(catalog.version_tags("BC-01"), vec!["default", "rev-b"]);
    }

    #[test]
    fn test_material_case_preserved_when_disabled() {
        let mut catalog = BomCatalog::new().with_material_case(false);
        let id = catalog.insert(NewLineItem::new("BC-01", " cap-100 ", 1)).unwrap();
        assert_eq!(catalog.get(id).unwrap().material, "cap-100");
    }

    #[test]
    fn test_list_filter() {
        let catalog = seeded();
        assert_eq!(catalog.list(&CatalogFilter::default()).len(), 3);
        assert_eq!(catalog.list(&CatalogFilter::bom("BC-01").version("rev-b")).len(), 1);
        assert!(catalog.list(&CatalogFilter::bom("BC-99")).is_empty());
    }

    #[test]
    fn test_active_items_unknown_bom() {
        let catalog = seeded();
        assert!(matches!(
            catalog.active_items("BC-99"),
            Err(BomReconError::UnknownBomCode(_))
        ));
    }

    #[test]
    fn test_activation_and_active_items() {
        let catalog = seeded();
        assert_eq!(catalog.active_items("BC-01").unwrap().len(), 2);

        catalog.set_active_version("BC-01", "rev-b").unwrap();
        let active = catalog.active_items("BC-01").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].qty, 4);
    }

    #[test]
    fn test_removing_last_item_releases_active() {
        let mut catalog = seeded();
        catalog.set_active_version("BC-01", "rev-b").unwrap();
        catalog.remove(3).unwrap();

        assert_eq!(catalog.resolver().explicit_version("BC-01"), None);
        assert_eq!(catalog.active_version("BC-01").unwrap(), "default");
        assert!(catalog.groups().is_ok());
    }

    #[test]
    fn test_copy_version_from_active() {
        let mut catalog = seeded();
        let ids = catalog.copy_version("BC-01", None, "rev-c").unwrap();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(catalog.version_items("BC-01", "rev-c").len(), 2);

        let err = catalog.copy_version("BC-01", None, "rev-c").unwrap_err();
        assert!(matches!(err, BomReconError::Validation(_)));
    }

    #[test]
    fn test_delete_version_clears_pointer() {
        let mut catalog = seeded();
        catalog.set_active_version("BC-01", "rev-b").unwrap();
        assert_eq!(catalog.delete_version("BC-01", "rev-b").unwrap(), 1);
        assert_eq!(catalog.active_version("BC-01").unwrap(), "default");
        assert!(matches!(
            catalog.delete_version("BC-01", "rev-b"),
            Err(BomReconError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_delete_bom() {
        let mut catalog = seeded();
        assert_eq!(catalog.delete_bom("BC-01").unwrap(), 3);
        assert!(catalog.is_empty());
        assert!(catalog.delete_bom("BC-01").is_err());
    }

    #[test]
    fn test_apply_batch_commits() {
        let mut catalog = seeded();
        let plan = BatchPlan::new()
            .create(NewLineItem::new("BC-01", "DIODE-9", 2))
            .update(1, NewLineItem::new("BC-01", "CAP-100", 6))
            .delete(2);

        let report = catalog.apply_batch(plan).unwrap();
        assert_eq!(report.created, vec![4]);
        assert_eq!(report.updated, vec![1]);
        assert_eq!(report.deleted, vec![2]);
        assert_eq!(catalog.get(1).unwrap().qty, 6);
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_apply_batch_is_all_or_nothing() {
        let mut catalog = seeded();
        let before: Vec<BomLineItem> = catalog.items().cloned().collect();
        let plan = BatchPlan::new()
            .create(NewLineItem::new("BC-01", "DIODE-9", 2))
            .update(1, NewLineItem::new("BC-01", "CAP-100", 0))
            .delete(77);

        match catalog.apply_batch(plan) {
            Err(BomReconError::PartialBatchFailure {
                failed,
                total,
                failed_keys,
            }) => {
                assert_eq!(failed, 2);
                assert_eq!(total, 3);
                assert_eq!(failed_keys, vec!["update:1", "delete:77"]);
            }
            other => panic!("Expected PartialBatchFailure, got {other:?}"),
        }
        let after: Vec<BomLineItem> = catalog.items().cloned().collect();
        assert_eq!(before, after);

        // ids are not consumed by a rejected batch
        let id = catalog.insert(NewLineItem::new("BC-01", "LED-1", 1)).unwrap();
        assert_eq!(id, 4);
    }

    #[test]
    fn test_restore_rejects_dangling_activation() {
        let items: Vec<BomLineItem> = seeded().items().cloned().collect();
        let err = BomCatalog::restore(items.clone(), [("BC-01".to_string(), "rev-z".to_string())])
            .unwrap_err();
        assert!(!err.is_recoverable());

        let catalog =
            BomCatalog::restore(items, [("BC-01".to_string(), "rev-b".to_string())]).unwrap();
        assert_eq!(catalog.active_version("BC-01").unwrap(), "rev-b");
        let id = {
            let mut catalog = catalog;
            catalog.insert(NewLineItem::new("BC-02", "X", 1)).unwrap()
        };
        assert_eq!(id, 4);
    }
}
