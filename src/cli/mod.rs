//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler loads the workspace snapshot named by the configuration,
//! performs one operation and writes the snapshot back when it changed.

mod actions;
mod catalog;
mod reconcile;

pub use actions::{run_actions_list, run_reset, run_set_status};
pub use catalog::{
    BomListOptions, EditOptions, run_activate, run_boms, run_copy_version, run_delete_version,
    run_edit, run_import,
};
pub use reconcile::{
    FinalizeOptions, ReconcileOptions, determine_exit_code, run_finalize, run_reconcile,
};
