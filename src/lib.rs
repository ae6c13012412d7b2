//! **Reconciliation of observed assemblies against versioned bills of materials.**
//!
//! `bom-recon` keeps a catalog of line-item BOMs, each BOM code holding one or
//! more versions with exactly one version in force. An observation (a set of
//! counted or detected parts) is compared against that version, every
//! material is classified as a shortage, an excess or an unlisted part, and
//! the reviewed findings are committed as tracked action items.
//!
//! ## Core Modules
//!
//! - **[`model`]**: line items, observations and action items, plus the
//!   [`model::wire`] records used at the JSON boundary.
//! - **[`catalog`]**: the [`BomCatalog`] with version resolution, grouping and
//!   all-or-nothing batch edits.
//! - **[`reconcile`]**: the [`ReconcileEngine`] and detector output folding.
//! - **[`actions`]**: the [`ActionItemDeriver`] that finalizes selections and
//!   drives the status workflow.
//! - **[`viewmodel`]**: grouped parent/child rows for tables.
//! - **[`reports`]**: JSON, summary and table renderers.
//! - **[`pipeline`]**: loading inputs, the workspace snapshot and output.
//!
//! ## Reconciling an Observation
//!
//! ```
//! use bom_recon::model::{ActualPart, NewLineItem, Observation};
//! use bom_recon::{BomCatalog, ReconcileEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut catalog = BomCatalog::new();
//!     catalog.insert(NewLineItem::new("BC-01", "CAP-100", 5))?;
//!     catalog.insert(NewLineItem::new("BC-01", "RES-220", 2))?;
//!
//!     let observation = Observation::new(
//!         "BC-01",
//!         vec![ActualPart::new("CAP-100", 3)?, ActualPart::new("RES-220", 2)?],
//!     );
//!     let result = ReconcileEngine::new().reconcile_observation(&catalog, &observation)?;
//!
//!     assert_eq!(result.summary.shortages, 1);
//!     assert_eq!(result.items[0].difference, -2);
//!     Ok(())
//! }
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! The `bom-recon` binary wraps these modules around a JSON workspace
//! snapshot; see `bom-recon --help`.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
// Pedantic lints: allow categories that are design choices for this codebase
#![allow(
    // Column widths and counts are small
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Report renderers are long match-heavy functions
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    // `bom_qty`/`bom_code` and friends read fine
    clippy::similar_names
)]

pub mod actions;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod reports;
pub mod utils;
pub mod viewmodel;

// Re-export main types for convenience
pub use actions::{ActionItemDeriver, FinalizeSelection, SelectedItem};
pub use catalog::{BatchPlan, BatchReport, BomCatalog, MaterialDraft};
pub use config::{AppConfig, AppConfigBuilder, ConfigPreset};
pub use config::{ConfigError, Validatable};
pub use error::{BomReconError, ErrorContext, Result};
pub use model::{
    ActionItem, ActionItemStatus, ActionItemType, ActualPart, BomLineItem, BomVersionGroup,
    Observation,
};
pub use pipeline::Workspace;
pub use reconcile::{
    Classification, CompareItemDetail, ObservationSet, ReconcileEngine, ReconcileResult,
    ReconcileSummary,
};
pub use reports::{ReportFormat, ReportGenerator};
