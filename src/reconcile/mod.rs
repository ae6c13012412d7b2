//! Reconciliation of observed parts against a BOM version.
//!
//! The [`ReconcileEngine`] sums both sides per material and classifies each
//! nonzero difference exactly once as shortage, excess or unlisted.
//! [`ObservationSet`] builds the observed side from detector output or
//! manual entry.

mod detection;
mod engine;
mod result;

pub use detection::{DetectionResult, DetectionSummary, ObservationSet};
pub use engine::ReconcileEngine;
pub use result::{Classification, CompareItemDetail, ReconcileResult, ReconcileSummary, TaskGroup};
