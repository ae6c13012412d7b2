//! BOM catalog: line-item storage, active versions, grouping and batch edits.
//!
//! - [`BomCatalog`] owns the raw line items
//! - [`VersionResolver`] holds the explicit active-version pointers
//! - [`group_by_version`] and [`aggregate_flat`] fold items for display and
//!   reconciliation
//! - [`plan_version_edit`] turns an edited version form into a [`BatchPlan`]

mod batch;
mod grouping;
mod store;
mod versions;

pub use batch::{BatchOp, BatchPlan, BatchReport, MaterialDraft, plan_version_edit};
pub use grouping::{aggregate_flat, group_by_version, group_by_version_with, implicit_active};
pub use store::{BomCatalog, CatalogFilter};
pub use versions::{Activation, VersionResolver, VersionSource};
