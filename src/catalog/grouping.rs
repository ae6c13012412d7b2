//! BOM grouping: versioned groups and the flat aggregated listing.

use super::versions::VersionResolver;
use crate::error::Result;
use crate::model::{
    AggregatedBomRow, BomLineItem, BomVersionGroup, DEFAULT_VERSION, normalize_version_tag,
};
use indexmap::IndexMap;

/// Bucket line items by BOM code, then by version tag.
///
/// Items keep their identity inside a bucket. Blank tags fold into
/// `"default"`. Each group's active version is the implicit one: `"default"`
/// when present, otherwise the first-seen tag.
#[must_use]
pub fn group_by_version(items: &[BomLineItem]) -> IndexMap<String, BomVersionGroup> {
    let mut groups: IndexMap<String, IndexMap<String, Vec<BomLineItem>>> = IndexMap::new();

    for item in items {
        let tag = normalize_version_tag(Some(&item.version_tag));
        let mut item = item.clone();
        item.version_tag.clone_from(&tag);
        groups
            .entry(item.bom_code.clone())
            .or_default()
            .entry(tag)
            .or_default()
            .push(item);
    }

    groups
        .into_iter()
        .map(|(bom_code, versions)| {
            let active_version = implicit_active(&versions);
            let group = BomVersionGroup {
                bom_code: bom_code.clone(),
                active_version,
                versions,
            };
            (bom_code, group)
        })
        .collect()
}

/// Like [`group_by_version`], with explicit activations from `resolver`.
///
/// An explicit pointer at a version absent from the items is reported as
/// an invariant violation.
pub fn group_by_version_with(
    items: &[BomLineItem],
    resolver: &VersionResolver,
) -> Result<IndexMap<String, BomVersionGroup>> {
    let mut groups = group_by_version(items);
    for group in groups.values_mut() {
        if let Some(tag) = resolver.explicit_version(&group.bom_code) {
            group.active_version = tag;
        }
        if let Err(err) = group.check_invariant() {
            tracing::error!("{}", err);
            return Err(err);
        }
    }
    Ok(groups)
}

/// Implicit active tag of a non-empty version map.
#[must_use]
pub fn implicit_active(versions: &IndexMap<String, Vec<BomLineItem>>) -> String {
    if versions.contains_key(DEFAULT_VERSION) {
        return DEFAULT_VERSION.to_string();
    }
    versions
        .keys()
        .next()
        .cloned()
        .unwrap_or_else(|| DEFAULT_VERSION.to_string())
}

/// Fold rows sharing `bomCode|partReference|partName` by summing `qty`.
///
/// Output follows first-seen key order; the first occurrence supplies the
/// description.
pub fn aggregate_flat<'a, I, R>(rows: I) -> Vec<AggregatedBomRow>
where
    I: IntoIterator<Item = &'a R>,
    R: 'a,
    AggregatedBomRow: From<&'a R>,
{
    let mut acc: IndexMap<(String, String, String), AggregatedBomRow> = IndexMap::new();
    for row in rows {
        let row = AggregatedBomRow::from(row);
        let key = (
            row.bom_code.clone(),
            row.part_reference.clone(),
            row.part_name.clone(),
        );
        match acc.get_mut(&key) {
            Some(existing) => existing.qty = existing.qty.saturating_add(row.qty),
            None => {
                acc.insert(key, row);
            }
        }
    }
    acc.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(
        id: u64,
        code: &str,
        tag: &str,
        reference: &str,
        material: &str,
        qty: i64,
    ) -> BomLineItem {
        BomLineItem {
            id,
            bom_code: code.to_string(),
            version_tag: tag.to_string(),
            part_reference: reference.to_string(),
            material: material.to_string(),
            description: String::new(),
            qty,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_version(&[]).is_empty());
        assert!(aggregate_flat::<_, BomLineItem>(&[]).is_empty());
    }

    #[test]
    fn test_blank_and_default_share_a_bucket() {
        let items = vec![
            item(1, "BC-01", "", "C1", "CAP-100", 5),
            item(2, "BC-01", "default", "R1", "RES-220", 3),
            item(3, "BC-01", "rev-b", "C1", "CAP-100", 4),
        ];
        let groups = group_by_version(&items);
        let group = &groups["BC-01"];

        assert_eq!(group.versions.len(), 2);
        assert_eq!(group.versions["default"].len(), 2);
        assert_eq!(group.active_version, "default");
        assert!(group.versions["default"].iter().all(|i| i.version_tag == "default"));
    }

    #[test]
    fn test_first_seen_version_is_implicit_active() {
        let items = vec![
            item(1, "BC-02", "v2", "C1", "CAP-100", 5),
            item(2, "BC-02", "v1", "C1", "CAP-100", 5),
        ];
        let groups = group_by_version(&items);
        assert_eq!(groups["BC-02"].active_version, "v2");
    }

    #[test]
    fn test_explicit_active_applied() {
        let items = vec![
            item(1, "BC-01", "default", "C1", "CAP-100", 5),
            item(2, "BC-01", "rev-b", "C1", "CAP-100", 4),
        ];
        let resolver = VersionResolver::new();
        resolver
            .set_active_version(items.as_slice(), "BC-01", "rev-b")
            .unwrap();

        let groups = group_by_version_with(&items, &resolver).unwrap();
        assert_eq!(groups["BC-01"].active_version, "rev-b");
        assert_eq!(groups["BC-01"].active_items()[0].qty, 4);
    }

    #[test]
    fn test_dangling_explicit_active_rejected() {
        let items = vec![item(1, "BC-01", "default", "C1", "CAP-100", 5)];
        let resolver = VersionResolver::from_map([("BC-01".to_string(), "rev-x".to_string())]);
        assert!(group_by_version_with(&items, &resolver).is_err());
    }

    #[test]
    fn test_aggregate_flat_sums_in_first_seen_order() {
        let items = vec![
            item(1, "BC-01", "default", "R1", "RES-220", 3),
            item(2, "BC-01", "default", "C1", "CAP-100", 5),
            item(3, "BC-01", "rev-b", "R1", "RES-220", 2),
        ];
        let rows = aggregate_flat(&items);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].part_name, "RES-220");
        assert_eq!(rows[0].qty, 5);
        assert_eq!(rows[1].part_name, "CAP-100");
    }

    #[test]
    fn test_aggregate_flat_is_idempotent() {
        let items = vec![
            item(1, "BC-01", "default", "R1", "RES-220", 3),
            item(2, "BC-01", "default", "R1", "RES-220", 3),
            item(3, "BC-02", "default", "R1", "RES-220", 1),
        ];
        let once = aggregate_flat(&items);
        let twice = aggregate_flat(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_aggregate_flat_keeps_separator_fields_apart() {
        let items = vec![
            item(1, "BC-01", "default", "A|B", "C", 1),
            item(2, "BC-01", "default", "A", "B|C", 1),
        ];
        let rows = aggregate_flat(&items);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].part_reference, "A|B");
        assert_eq!(rows[1].part_name, "B|C");
    }

    #[test]
    fn test_aggregate_flat_saturates_large_sums() {
        let items = vec![
            item(1, "BC-01", "default", "C1", "CAP-100", i64::MAX),
            item(2, "BC-01", "rev-b", "C1", "CAP-100", 5),
        ];
        let rows = aggregate_flat(&items);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].qty, i64::MAX);
    }
}
