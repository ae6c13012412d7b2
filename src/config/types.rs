//! Configuration types for bom-recon.

use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the workspace snapshot.
pub const DEFAULT_STATE_FILE: &str = "bom-recon-state.json";

/// Default number of chips shown per collapsed group.
pub const DEFAULT_PREVIEW_LIMIT: usize = 2;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// CLI arguments are layered over file values with [`AppConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Reconciliation settings
    pub reconcile: ReconcileConfig,
    /// Default finalize proposal
    pub finalize: FinalizeConfig,
    /// Grouped table display
    pub view: ViewConfig,
    /// Output configuration (format, file, colors)
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
    /// Workspace snapshot location
    pub state: StateConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Trim and upper-case material names at ingestion.
    pub const fn normalize_material_case(mut self, enabled: bool) -> Self {
        self.config.reconcile.normalize_material_case = enabled;
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Disable colored output.
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.config.output.no_color = no_color;
        self
    }

    pub const fn preview_limit(mut self, limit: usize) -> Self {
        self.config.view.preview_limit = limit;
        self
    }

    /// Exit with code 1 when shortages are found.
    pub const fn fail_on_shortage(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_shortage = fail;
        self
    }

    /// Exit with code 2 when unlisted parts are found.
    pub const fn fail_on_unlisted(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_unlisted = fail;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Set the workspace snapshot path.
    pub fn state_path(mut self, path: PathBuf) -> Self {
        self.config.state.path = path;
        self
    }

    /// Build the `AppConfig`.
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Trim and upper-case material names before comparing
    pub normalize_material_case: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            normalize_material_case: true,
        }
    }
}

/// Which findings the default finalize proposal pre-selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FinalizeConfig {
    /// Pre-select every shortage at its missing quantity
    pub include_shortages: bool,
    /// Pre-select every unlisted part at its found quantity
    pub include_unlisted: bool,
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        Self {
            include_shortages: true,
            include_unlisted: true,
        }
    }
}

/// Grouped table display settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ViewConfig {
    /// Children shown per collapsed group before "+N"
    #[schemars(range(min = 1))]
    pub preview_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Disable colored output
    pub no_color: bool,
}

/// Behavior flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Exit with code 1 if the reconciliation finds shortages
    pub fail_on_shortage: bool,
    /// Exit with code 2 if the reconciliation finds unlisted parts
    pub fail_on_unlisted: bool,
    /// Suppress non-essential output
    pub quiet: bool,
}

/// Workspace snapshot location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StateConfig {
    /// JSON file holding line items, active versions and action items
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}
