//! Presentation-agnostic view models.
//!
//! Everything here is pure: the same rows and expansion set always produce
//! the same tree, so callers can re-run grouping after every filter or sort.

mod bom_view;
mod grouped;

pub use bom_view::{ActionGroupView, BomGroupView, action_groups, bom_groups};
pub use grouped::{
    GroupedRow, Preview, collapsed_preview, flatten, group, leaves, preview_where, rollup_sum,
    visible_rows,
};
