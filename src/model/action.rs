//! Follow-up action items derived from finalized reconciliations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of follow-up an action item tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionItemType {
    /// Part missing from the assembly; `quantity_diff` is negative
    Shortage,
    /// Part found but absent from the BOM; `quantity_diff` is positive
    Unlisted,
}

impl fmt::Display for ActionItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shortage => write!(f, "SHORTAGE"),
            Self::Unlisted => write!(f, "UNLISTED"),
        }
    }
}

/// Workflow status of an action item.
///
/// `BARU_MASUK -> DITINDAKLANJUTI -> SELESAI`, with `BARU_MASUK -> SELESAI`
/// also allowed. `SELESAI` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionItemStatus {
    /// Newly created
    #[default]
    BaruMasuk,
    /// Being followed up
    Ditindaklanjuti,
    /// Resolved
    Selesai,
}

impl ActionItemStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Selesai)
    }

    /// Whether the workflow permits moving from `self` to `next`.
    ///
    /// Re-applying the current status is not a transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::BaruMasuk, Self::Ditindaklanjuti)
                | (Self::BaruMasuk, Self::Selesai)
                | (Self::Ditindaklanjuti, Self::Selesai)
        )
    }

    /// Human-readable label used in tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BaruMasuk => "Baru Masuk",
            Self::Ditindaklanjuti => "Ditindaklanjuti",
            Self::Selesai => "Selesai",
        }
    }
}

impl fmt::Display for ActionItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaruMasuk => write!(f, "BARU_MASUK"),
            Self::Ditindaklanjuti => write!(f, "DITINDAKLANJUTI"),
            Self::Selesai => write!(f, "SELESAI"),
        }
    }
}

impl FromStr for ActionItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "BARU_MASUK" => Ok(Self::BaruMasuk),
            "DITINDAKLANJUTI" => Ok(Self::Ditindaklanjuti),
            "SELESAI" => Ok(Self::Selesai),
            other => Err(format!(
                "unknown status '{other}' (expected BARU_MASUK, DITINDAKLANJUTI or SELESAI)"
            )),
        }
    }
}

/// Review task status of a compared item.
///
/// Independent of the shortage/excess/unlisted classification and of the
/// action item workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Belum Ada Status")]
    BelumAdaStatus,
    #[serde(rename = "Follow Up")]
    FollowUp,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub const ALL: [Self; 3] = [Self::BelumAdaStatus, Self::FollowUp, Self::Done];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BelumAdaStatus => "Belum Ada Status",
            Self::FollowUp => "Follow Up",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|status| status.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown task status '{s}'"))
    }
}

/// A persisted follow-up record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: u64,
    pub bom_code: String,
    pub part_name: String,
    pub item_type: ActionItemType,
    pub quantity_diff: i64,
    pub status: ActionItemStatus,
    /// Finalize batch this item was created in (1-based per BOM code)
    pub batch: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActionItem {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use ActionItemStatus::*;

        assert!(BaruMasuk.can_transition_to(Ditindaklanjuti));
        assert!(BaruMasuk.can_transition_to(Selesai));
        assert!(Ditindaklanjuti.can_transition_to(Selesai));

        assert!(!Ditindaklanjuti.can_transition_to(BaruMasuk));
        assert!(!Selesai.can_transition_to(BaruMasuk));
        assert!(!Selesai.can_transition_to(Ditindaklanjuti));
        assert!(!BaruMasuk.can_transition_to(BaruMasuk));
        assert!(Selesai.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("baru_masuk".parse(), Ok(ActionItemStatus::BaruMasuk));
        assert_eq!("Baru Masuk".parse(), Ok(ActionItemStatus::BaruMasuk));
        assert_eq!("SELESAI".parse(), Ok(ActionItemStatus::Selesai));
        assert!("CLOSED".parse::<ActionItemStatus>().is_err());
    }

    #[test]
    fn test_task_status_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::BelumAdaStatus).unwrap(),
            "\"Belum Ada Status\""
        );
        assert_eq!("follow-up".parse(), Ok(TaskStatus::FollowUp));
        assert_eq!("DONE".parse(), Ok(TaskStatus::Done));
        assert!("later".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&ActionItemStatus::Ditindaklanjuti).unwrap(),
            "\"DITINDAKLANJUTI\""
        );
        assert_eq!(
            serde_json::to_string(&ActionItemType::Unlisted).unwrap(),
            "\"UNLISTED\""
        );
    }
}
