//! Pipeline orchestration for CLI operations.
//!
//! Shared load → reconcile → report plumbing, so command handlers stay
//! small: workspace snapshots, observation files, output routing and exit
//! codes.

mod load;
mod report_stage;
mod state;

pub use load::{LoadedInputs, load_inputs, load_line_items, load_observation};
pub use report_stage::{
    ReportDestination, ReportSubject, output_report, render_report, write_proposal,
};
pub use state::{STATE_FORMAT_VERSION, Workspace, WorkspaceState};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read or parse an input file
    #[error("Load failed for {path}: {source}")]
    LoadFailed {
        path: String,
        source: anyhow::Error,
    },

    /// Report generation or output failed
    #[error("Report failed: {source}")]
    ReportFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - no findings (or no fail flag set)
    pub const SUCCESS: i32 = 0;
    /// Shortages were found
    pub const SHORTAGES_FOUND: i32 = 1;
    /// Unlisted parts were found
    pub const UNLISTED_FOUND: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}
