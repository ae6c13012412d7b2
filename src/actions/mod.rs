//! Action items derived from finalized reconciliations.
//!
//! Finalizing a reconciliation turns the selected shortages and unlisted
//! parts into tracked follow-up items, grouped into numbered batches per
//! BOM code.

mod deriver;

pub use deriver::{ActionItemDeriver, ActionLedger, FinalizeBatch, FinalizeSelection, SelectedItem};
