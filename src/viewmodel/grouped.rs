//! Stateless grouped-row tree for hierarchical tables.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// A node of the grouped table: either a group with children or a leaf
/// wrapping an original row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRow<T> {
    pub key: String,
    pub depth: usize,
    pub is_group: bool,
    pub children: Vec<GroupedRow<T>>,
    pub original: Option<T>,
}

impl<T> GroupedRow<T> {
    fn leaf(key: String, depth: usize, row: T) -> Self {
        Self {
            key,
            depth,
            is_group: false,
            children: Vec::new(),
            original: Some(row),
        }
    }

    /// Number of leaves below this node (1 for a leaf).
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.is_group {
            self.children.iter().map(Self::leaf_count).sum()
        } else {
            1
        }
    }

    /// Original rows below this node, in order.
    #[must_use]
    pub fn leaf_rows(&self) -> Vec<&T> {
        let mut out = Vec::new();
        collect_leaves(std::slice::from_ref(self), &mut out);
        out
    }
}

/// First `limit` items plus how many were left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview<T> {
    pub visible: Vec<T>,
    pub remaining: usize,
}

/// Group rows by key. Groups follow first-seen key order; children keep
/// their original order. Leaf keys are `"{group}/{index}"` with the row's
/// index in the input.
pub fn group<T, K, F>(rows: impl IntoIterator<Item = T>, key_fn: F) -> Vec<GroupedRow<T>>
where
    F: Fn(&T) -> K,
    K: Into<String>,
{
    let mut buckets: IndexMap<String, Vec<(usize, T)>> = IndexMap::new();
    for (index, row) in rows.into_iter().enumerate() {
        buckets
            .entry(key_fn(&row).into())
            .or_default()
            .push((index, row));
    }

    buckets
        .into_iter()
        .map(|(key, rows)| GroupedRow {
            children: rows
                .into_iter()
                .map(|(index, row)| GroupedRow::leaf(format!("{key}/{index}"), 1, row))
                .collect(),
            key,
            depth: 0,
            is_group: true,
            original: None,
        })
        .collect()
}

/// The first `limit` children and the overflow count.
pub fn collapsed_preview<T>(children: &[T], limit: usize) -> Preview<&T> {
    Preview {
        visible: children.iter().take(limit).collect(),
        remaining: children.len().saturating_sub(limit),
    }
}

/// [`collapsed_preview`] over the children matching `pred`.
pub fn preview_where<T, P>(children: &[T], limit: usize, pred: P) -> Preview<&T>
where
    P: Fn(&T) -> bool,
{
    let matching: Vec<&T> = children.iter().filter(|c| pred(c)).collect();
    let remaining = matching.len().saturating_sub(limit);
    Preview {
        visible: matching.into_iter().take(limit).collect(),
        remaining,
    }
}

/// Sum `field` over every leaf below `children`.
pub fn rollup_sum<T, F>(children: &[GroupedRow<T>], field: F) -> i64
where
    F: Fn(&T) -> i64,
{
    fn walk<T, F: Fn(&T) -> i64>(rows: &[GroupedRow<T>], field: &F) -> i64 {
        rows.iter()
            .map(|row| match &row.original {
                Some(original) if !row.is_group => field(original),
                _ => walk(&row.children, field),
            })
            .fold(0, i64::saturating_add)
    }
    walk(children, &field)
}

/// Depth-first pre-order listing: each group, then its children.
#[must_use]
pub fn flatten<T>(tree: &[GroupedRow<T>]) -> Vec<&GroupedRow<T>> {
    let mut out = Vec::new();
    for row in tree {
        out.push(row);
        out.extend(flatten(&row.children));
    }
    out
}

/// Original rows of the tree in order.
#[must_use]
pub fn leaves<T>(tree: &[GroupedRow<T>]) -> Vec<&T> {
    let mut out = Vec::new();
    collect_leaves(tree, &mut out);
    out
}

fn collect_leaves<'a, T>(tree: &'a [GroupedRow<T>], out: &mut Vec<&'a T>) {
    for row in tree {
        match &row.original {
            Some(original) if !row.is_group => out.push(original),
            _ => collect_leaves(&row.children, out),
        }
    }
}

/// Rows to render given the caller's expanded group keys. Groups are always
/// shown; children only under an expanded group.
#[must_use]
pub fn visible_rows<'a, T>(
    tree: &'a [GroupedRow<T>],
    expanded: &HashSet<String>,
) -> Vec<&'a GroupedRow<T>> {
    let mut out = Vec::new();
    for row in tree {
        out.push(row);
        if row.is_group && expanded.contains(&row.key) {
            out.extend(visible_rows(&row.children, expanded));
        }
    }
    out
}
