//! Named configuration presets.

use super::types::{AppConfig, BehaviorConfig, FinalizeConfig, OutputConfig};
use crate::reports::ReportFormat;

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Interactive review with colored summaries
    Default,
    /// Machine-readable output, fail on any shortage or unlisted part
    CiCd,
    /// Only shortages are proposed for follow-up
    ShortagesOnly,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::CiCd => "ci-cd",
            Self::ShortagesOnly => "shortages-only",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "ci-cd" | "ci" | "pipeline" => Some(Self::CiCd),
            "shortages-only" | "shortages" => Some(Self::ShortagesOnly),
            _ => None,
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Colored summaries, every finding proposed for follow-up",
            Self::CiCd => "JSON output with non-zero exit codes on findings",
            Self::ShortagesOnly => "Propose only shortages when finalizing",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::CiCd, Self::ShortagesOnly]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::CiCd => Self {
                output: OutputConfig {
                    format: ReportFormat::Json,
                    file: None,
                    no_color: true,
                },
                behavior: BehaviorConfig {
                    fail_on_shortage: true,
                    fail_on_unlisted: true,
                    quiet: true,
                },
                ..Self::default()
            },
            ConfigPreset::ShortagesOnly => Self {
                finalize: FinalizeConfig {
                    include_shortages: true,
                    include_unlisted: false,
                },
                ..Self::default()
            },
        }
    }
}
