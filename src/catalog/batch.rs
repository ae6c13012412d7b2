//! Batch edits of a BOM version.

use crate::error::{BomReconError, Result};
use crate::model::{BomLineItem, NewLineItem, normalize_material, normalize_version_tag};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single catalog mutation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BatchOp {
    Create { item: NewLineItem },
    Update { id: u64, item: NewLineItem },
    Delete { id: u64 },
}

impl BatchOp {
    /// Key reported back when this operation fails.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Create { item } => format!("create:{}", item.material.trim()),
            Self::Update { id, .. } => format!("update:{id}"),
            Self::Delete { id } => format!("delete:{id}"),
        }
    }
}

/// Ordered set of mutations applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub ops: Vec<BatchOp>,
}

impl BatchPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn create(mut self, item: NewLineItem) -> Self {
        self.ops.push(BatchOp::Create { item });
        self
    }

    #[must_use]
    pub fn update(mut self, id: u64, item: NewLineItem) -> Self {
        self.ops.push(BatchOp::Update { id, item });
        self
    }

    #[must_use]
    pub fn delete(mut self, id: u64) -> Self {
        self.ops.push(BatchOp::Delete { id });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Counts of `(creates, updates, deletes)`.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        self.ops.iter().fold((0, 0, 0), |(c, u, d), op| match op {
            BatchOp::Create { .. } => (c + 1, u, d),
            BatchOp::Update { .. } => (c, u + 1, d),
            BatchOp::Delete { .. } => (c, u, d + 1),
        })
    }
}

/// Ids touched by a committed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub created: Vec<u64>,
    pub updated: Vec<u64>,
    pub deleted: Vec<u64>,
}

/// An edited material row of a version form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDraft {
    /// Stored id, `None` for rows added in this edit
    #[serde(default)]
    pub id: Option<u64>,
    pub material: String,
    #[serde(default)]
    pub part_reference: String,
    #[serde(default)]
    pub description: String,
    pub qty: i64,
}

impl MaterialDraft {
    pub fn new(material: impl Into<String>, qty: i64) -> Self {
        Self {
            material: material.into(),
            qty,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Draft prefilled from a stored line item.
    #[must_use]
    pub fn from_item(item: &BomLineItem) -> Self {
        Self {
            id: Some(item.id),
            material: item.material.clone(),
            part_reference: item.part_reference.clone(),
            description: item.description.clone(),
            qty: item.qty,
        }
    }
}

/// Diff the edited rows of `(bom_code, version_tag)` against its stored
/// items.
///
/// Rows with a blank material are ignored. Rows without an id become
/// creates, rows with an id become updates, and stored ids missing from the
/// edit become deletes.
pub fn plan_version_edit(
    bom_code: &str,
    version_tag: Option<&str>,
    original: &[BomLineItem],
    drafts: Vec<MaterialDraft>,
    upper_case: bool,
) -> Result<BatchPlan> {
    let tag = normalize_version_tag(version_tag);
    let drafts: Vec<MaterialDraft> = drafts
        .into_iter()
        .filter(|d| !d.material.trim().is_empty())
        .collect();

    if drafts.is_empty() && !original.is_empty() {
        return Err(BomReconError::validation(format!(
            "edit removes every material of BOM {bom_code} version '{tag}'; delete the version instead"
        )));
    }

    if let Some(bad) = drafts.iter().find(|d| d.qty <= 0) {
        return Err(BomReconError::invalid_quantity(
            format!("material {}", bad.material.trim()),
            bad.qty,
        ));
    }

    let known: HashSet<u64> = original.iter().map(|i| i.id).collect();
    let mut kept = HashSet::new();
    let mut plan = BatchPlan::new();

    for draft in drafts {
        let item = NewLineItem {
            bom_code: bom_code.to_string(),
            version_tag: Some(tag.clone()),
            part_reference: draft.part_reference,
            material: normalize_material(&draft.material, upper_case),
            description: draft.description,
            qty: draft.qty,
        };
        plan = match draft.id {
            Some(id) if known.contains(&id) => {
                kept.insert(id);
                plan.update(id, item)
            }
            Some(id) => {
                return Err(BomReconError::validation(format!(
                    "line item {id} does not belong to BOM {bom_code} version '{tag}'"
                )));
            }
            None => plan.create(item),
        };
    }

    for item in original.iter().filter(|i| !kept.contains(&i.id)) {
        plan = plan.delete(item.id);
    }

    let (creates, updates, deletes) = plan.counts();
    tracing::debug!(
        "Planned edit of {}/{}: {} creates, {} updates, {} deletes",
        bom_code,
        tag,
        creates,
        updates,
        deletes
    );
    Ok(plan)
}
