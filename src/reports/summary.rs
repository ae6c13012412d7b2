//! Summary and table report generators for terminal output.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::model::AggregatedBomRow;
use crate::reconcile::{Classification, ReconcileResult};
use crate::viewmodel::{ActionGroupView, BomGroupView, Preview, visible_rows};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Apply an ANSI color to text when coloring is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

const fn class_color(classification: Classification) -> &'static str {
    match classification {
        Classification::Shortage => "red",
        Classification::Excess => "yellow",
        Classification::Unlisted => "cyan",
    }
}

/// Render a chip preview as `A, B +N`, or `-` when empty.
fn chips(preview: &Preview<String>) -> String {
    if preview.visible.is_empty() {
        return "-".to_string();
    }
    let mut out = preview.visible.join(", ");
    if preview.remaining > 0 {
        out.push_str(&format!(" +{}", preview.remaining));
    }
    out
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    /// Use colored output
    colored: bool,
}

impl SummaryReporter {
    /// Create a new summary reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate_reconcile_report(
        &self,
        result: &ReconcileResult,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        let summary = &result.summary;

        let title = config.title.as_deref().unwrap_or("BOM Reconciliation");
        lines.push(self.color(title, "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));
        lines.push(format!(
            "{}  {} / {}",
            self.color("BOM:", "cyan"),
            result.bom_code,
            result.version_tag
        ));
        lines.push(format!(
            "{}  {} compared, {} matched ({} BOM lines)",
            self.color("Materials:", "cyan"),
            summary.materials,
            summary.matched,
            summary.bom_lines
        ));

        lines.push(String::new());
        lines.push(self.color("Findings:", "bold"));
        if result.items.is_empty() {
            lines.push(format!("  {}", self.color("No differences", "dim")));
        }
        for item in &result.items {
            let diff = format!("{:+}", item.difference);
            lines.push(format!(
                "  {} {} {}",
                self.color(&diff, class_color(item.classification)),
                item.material,
                self.color(&item.classification.label().to_lowercase(), "dim")
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "{}  {} shortages ({} missing), {} excess, {} unlisted ({} surplus in total)",
            self.color("Totals:", "cyan"),
            summary.shortages,
            summary.total_missing,
            summary.excesses,
            summary.unlisted,
            summary.total_surplus
        ));
        lines.push(format!(
            "{}  {}",
            self.color("Fingerprint:", "cyan"),
            result.fingerprint_hex()
        ));

        Ok(lines.join("\n"))
    }

    fn generate_bom_report(
        &self,
        groups: &[BomGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        lines.push(self.color(config.title.as_deref().unwrap_or("BOM Catalog"), "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));

        if groups.is_empty() {
            lines.push(self.color("No BOMs", "dim"));
        }
        for group in groups {
            let others: Vec<&str> = group
                .versions
                .iter()
                .map(String::as_str)
                .filter(|v| *v != group.active_version)
                .collect();
            let mut header = format!(
                "{} ({})  active: {}",
                self.color(&group.bom_code, "bold"),
                group.line_count,
                self.color(&group.active_version, "green")
            );
            if !others.is_empty() {
                header.push_str(&format!("  other: {}", others.join(", ")));
            }
            lines.push(header);
            lines.push(format!(
                "  qty {}  {}",
                group.total_qty,
                chips(&group.materials)
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Total: {} BOMs, {} active lines",
            groups.len(),
            groups.iter().map(|g| g.line_count).sum::<usize>()
        ));
        Ok(lines.join("\n"))
    }

    fn generate_flat_report(
        &self,
        rows: &[AggregatedBomRow],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        lines.push(self.color(config.title.as_deref().unwrap_or("BOM Listing"), "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));
        for row in rows {
            let reference = if row.part_reference.is_empty() {
                String::new()
            } else {
                format!(" [{}]", row.part_reference)
            };
            lines.push(format!(
                "{}  {}{}  x{}",
                self.color(&row.bom_code, "cyan"),
                row.part_name,
                reference,
                row.qty
            ));
        }
        lines.push(String::new());
        lines.push(format!(
            "Total: {} rows, qty {}",
            rows.len(),
            rows.iter().fold(0, |acc: i64, r| acc.saturating_add(r.qty))
        ));
        Ok(lines.join("\n"))
    }

    fn generate_action_report(
        &self,
        groups: &[ActionGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        lines.push(self.color(config.title.as_deref().unwrap_or("Action Items"), "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));

        if groups.is_empty() {
            lines.push(self.color("No action items", "dim"));
        }
        for group in groups {
            let open = if group.open > 0 {
                self.color(&format!("{} open", group.open), "yellow")
            } else {
                self.color("all resolved", "green")
            };
            lines.push(format!(
                "{}  batch #{}  {}",
                self.color(&group.label(), "bold"),
                group.latest_batch,
                open
            ));
            lines.push(format!(
                "  {} {}",
                self.color("Shortage:", "red"),
                chips(&group.shortages)
            ));
            lines.push(format!(
                "  {} {}",
                self.color("Unlisted:", "cyan"),
                chips(&group.unlisted)
            ));
        }

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}

/// Table reporter for aligned terminal output
pub struct TableReporter {
    /// Use colored output
    colored: bool,
}

impl TableReporter {
    /// Create a new table reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Pad to `width` display columns first, then color, so escape codes
    /// never count towards alignment.
    fn cell(&self, text: &str, width: usize, color: &str) -> String {
        ansi_color(&pad(&truncate(text, width), width), color, self.colored)
    }
}

impl Default for TableReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for TableReporter {
    fn generate_reconcile_report(
        &self,
        result: &ReconcileResult,
        _config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();

        lines.push(
            [
                self.cell("CLASS", 10, "bold"),
                self.cell("MATERIAL", 30, "bold"),
                self.cell("BOM", 6, "bold"),
                self.cell("ACTUAL", 6, "bold"),
                self.cell("DIFF", 6, "bold"),
                self.cell("STATUS", 16, "bold"),
                self.cell("PIC", 12, "bold"),
            ]
            .join(" "),
        );
        lines.push("─".repeat(92));

        for item in &result.items {
            lines.push(
                [
                    self.cell(item.classification.label(), 10, class_color(item.classification)),
                    self.cell(&item.material, 30, ""),
                    self.cell(&item.bom_qty.to_string(), 6, ""),
                    self.cell(&item.actual_qty.to_string(), 6, ""),
                    self.cell(
                        &format!("{:+}", item.difference),
                        6,
                        class_color(item.classification),
                    ),
                    self.cell(item.status.label(), 16, ""),
                    self.cell(item.pic.as_deref().unwrap_or("-"), 12, ""),
                ]
                .join(" ")
                .trim_end()
                .to_string(),
            );
        }

        let summary = &result.summary;
        lines.push(String::new());
        lines.push(format!(
            "Total: {} shortages, {} excess, {} unlisted | Matched: {} of {} | {}/{}",
            summary.shortages,
            summary.excesses,
            summary.unlisted,
            summary.matched,
            summary.materials,
            result.bom_code,
            result.version_tag
        ));
        Ok(lines.join("\n"))
    }

    fn generate_bom_report(
        &self,
        groups: &[BomGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();

        lines.push(
            [
                self.cell("BOM CODE", 24, "bold"),
                self.cell("ACTIVE", 12, "bold"),
                self.cell("VERSIONS", 8, "bold"),
                self.cell("LINES", 6, "bold"),
                self.cell("QTY", 6, "bold"),
                self.cell("MATERIALS", 30, "bold"),
            ]
            .join(" "),
        );
        lines.push("─".repeat(91));

        let expanded = config.expanded_keys(groups.iter().map(|g| g.bom_code.as_str()));
        for group in groups {
            lines.push(
                [
                    self.cell(&format!("▸ {}", group.bom_code), 24, "bold"),
                    self.cell(&group.active_version, 12, "green"),
                    self.cell(&group.versions.len().to_string(), 8, ""),
                    self.cell(&group.line_count.to_string(), 6, ""),
                    self.cell(&group.total_qty.to_string(), 6, ""),
                    self.cell(&chips(&group.materials), 30, "dim"),
                ]
                .join(" ")
                .trim_end()
                .to_string(),
            );
            for row in visible_rows(std::slice::from_ref(&group.tree), &expanded) {
                let Some(item) = row.original.as_ref().filter(|_| !row.is_group) else {
                    continue;
                };
                lines.push(
                    [
                        self.cell(&format!("    {}", item.material), 24, ""),
                        self.cell(&item.part_reference, 12, "dim"),
                        self.cell("", 8, ""),
                        self.cell("", 6, ""),
                        self.cell(&item.qty.to_string(), 6, ""),
                        self.cell(&item.description, 30, "dim"),
                    ]
                    .join(" ")
                    .trim_end()
                    .to_string(),
                );
            }
        }

        lines.push(String::new());
        lines.push(format!("Total: {} BOMs", groups.len()));
        Ok(lines.join("\n"))
    }

    fn generate_flat_report(
        &self,
        rows: &[AggregatedBomRow],
        _config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();

        lines.push(
            [
                self.cell("BOM CODE", 20, "bold"),
                self.cell("REF", 10, "bold"),
                self.cell("PART", 30, "bold"),
                self.cell("QTY", 6, "bold"),
                self.cell("DESCRIPTION", 30, "bold"),
            ]
            .join(" "),
        );
        lines.push("─".repeat(100));
        for row in rows {
            lines.push(
                [
                    self.cell(&row.bom_code, 20, ""),
                    self.cell(&row.part_reference, 10, "dim"),
                    self.cell(&row.part_name, 30, ""),
                    self.cell(&row.qty.to_string(), 6, ""),
                    self.cell(&row.description, 30, "dim"),
                ]
                .join(" ")
                .trim_end()
                .to_string(),
            );
        }
        lines.push(String::new());
        lines.push(format!("Total: {} rows", rows.len()));
        Ok(lines.join("\n"))
    }

    fn generate_action_report(
        &self,
        groups: &[ActionGroupView],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();

        lines.push(
            [
                self.cell("BOM CODE", 20, "bold"),
                self.cell("BATCH", 6, "bold"),
                self.cell("OPEN", 5, "bold"),
                self.cell("SHORTAGE", 28, "bold"),
                self.cell("UNLISTED", 28, "bold"),
            ]
            .join(" "),
        );
        lines.push("─".repeat(91));

        let expanded = config.expanded_keys(groups.iter().map(|g| g.bom_code.as_str()));
        for group in groups {
            lines.push(
                [
                    self.cell(&format!("▸ {}", group.label()), 20, "bold"),
                    self.cell(&format!("#{}", group.latest_batch), 6, ""),
                    self.cell(
                        &group.open.to_string(),
                        5,
                        if group.open > 0 { "yellow" } else { "green" },
                    ),
                    self.cell(&chips(&group.shortages), 28, "red"),
                    self.cell(&chips(&group.unlisted), 28, "cyan"),
                ]
                .join(" ")
                .trim_end()
                .to_string(),
            );
            for row in visible_rows(std::slice::from_ref(&group.tree), &expanded) {
                let Some(item) = row.original.as_ref().filter(|_| !row.is_group) else {
                    continue;
                };
                lines.push(
                    [
                        self.cell(&format!("    #{} {}", item.id, item.part_name), 20, ""),
                        self.cell(&format!("#{}", item.batch), 6, "dim"),
                        self.cell("", 5, ""),
                        self.cell(
                            &format!("{} ({:+})", item.item_type, item.quantity_diff),
                            28,
                            "",
                        ),
                        self.cell(item.status.label(), 28, "dim"),
                    ]
                    .join(" ")
                    .trim_end()
                    .to_string(),
                );
            }
        }

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Table
    }
}

/// Truncate a string to `max_width` display columns.
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let budget = if max_width > 3 { max_width - 3 } else { max_width };
    let mut width = 0;
    let truncated: String = s
        .chars()
        .take_while(|ch| {
            let w = UnicodeWidthChar::width(*ch).unwrap_or(0);
            if width + w > budget {
                return false;
            }
            width += w;
            true
        })
        .collect();
    if max_width > 3 {
        format!("{truncated}...")
    } else {
        truncated
    }
}

/// Right-pad to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(used)))
}
