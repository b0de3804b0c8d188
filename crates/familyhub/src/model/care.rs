//! Caregiving records: medications, dose logs, tasks and shopping items.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::family::{FamilyId, MemberId};

/// Part of the day a medication is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    /// Morning dose.
    Morning,
    /// Evening dose.
    Evening,
}

text_enum!(TimeWindow {
    Morning => "morning",
    Evening => "evening",
});

/// Outcome of a scheduled dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    /// Not given yet.
    Pending,
    /// Given on time.
    Done,
    /// Given late.
    DoneLate,
    /// Not given.
    Missed,
}

text_enum!(DoseStatus {
    Pending => "pending",
    Done => "done",
    DoneLate => "done_late",
    Missed => "missed",
});

impl DoseStatus {
    /// Whether the dose counts as taken.
    #[must_use]
    pub const fn is_taken(self) -> bool {
        matches!(self, Self::Done | Self::DoneLate)
    }
}

/// Task progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Just created.
    New,
    /// Someone is on it.
    InProgress,
    /// Blocked on someone else.
    Waiting,
    /// Done.
    Completed,
    /// Dropped.
    Cancelled,
}

text_enum!(TaskStatus {
    New => "new",
    InProgress => "in_progress",
    Waiting => "waiting",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl TaskStatus {
    /// Completed and cancelled tasks are closed.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Shopping item progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShoppingStatus {
    /// Still needed.
    Open,
    /// Bought.
    Bought,
}

text_enum!(ShoppingStatus {
    Open => "open",
    Bought => "bought",
});

/// A medication on the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Name.
    pub name: String,
    /// Free-form dosage description.
    pub dosage: Option<String>,
    /// When it is due.
    pub time_window: TimeWindow,
    /// Inactive medications are not scheduled.
    pub is_active: bool,
}

/// Fields for adding a medication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedication {
    /// Owning family.
    pub family_id: FamilyId,
    /// Name.
    pub name: String,
    /// Dosage description.
    pub dosage: Option<String>,
    /// When it is due.
    pub time_window: TimeWindow,
}

/// Record of one dose on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseLog {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Medication given.
    pub medication_id: i64,
    /// Calendar day.
    pub date: NaiveDate,
    /// Window the dose belongs to.
    pub time_window: TimeWindow,
    /// Outcome.
    pub status: DoseStatus,
    /// Who logged it.
    pub logged_by: Option<MemberId>,
}

/// A shared task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Description.
    pub title: String,
    /// Assignee.
    pub assigned_to: Option<MemberId>,
    /// Progress.
    pub status: TaskStatus,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

/// An item on the shared shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// What to buy.
    pub name: String,
    /// Free-form quantity.
    pub quantity: Option<String>,
    /// Progress.
    pub status: ShoppingStatus,
    /// When it was added.
    pub created_at: DateTime<Utc>,
}
