//! Report type definitions.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format for reports
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Summary on a terminal, JSON when piped
    #[default]
    Auto,
    /// Structured JSON output
    Json,
    /// Brief summary output
    Summary,
    /// Aligned table for terminal (colored)
    Table,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Json => write!(f, "json"),
            Self::Summary => write!(f, "summary"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Configuration for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Title for the report
    pub title: Option<String>,
    /// Chips shown per collapsed group
    pub preview_limit: usize,
    /// Show child rows under every group in grouped tables
    pub expand_all: bool,
    /// Group keys whose child rows are shown
    pub expanded: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: None,
            preview_limit: crate::config::DEFAULT_PREVIEW_LIMIT,
            expand_all: false,
            expanded: Vec::new(),
        }
    }
}

impl ReportConfig {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    #[must_use]
    pub const fn expand_all(mut self, expand: bool) -> Self {
        self.expand_all = expand;
        self
    }

    /// Expand one group of a grouped table.
    #[must_use]
    pub fn expand(mut self, key: impl Into<String>) -> Self {
        self.expanded.push(key.into());
        self
    }

    /// Expanded group keys among `keys`.
    pub(crate) fn expanded_keys<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> std::collections::HashSet<String> {
        keys.into_iter()
            .filter(|key| self.expand_all || self.expanded.iter().any(|k| k == key))
            .map(str::to_string)
            .collect()
    }
}
