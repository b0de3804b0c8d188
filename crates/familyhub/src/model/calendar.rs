//! Shared calendar: who is on duty each day, and family events.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::family::{FamilyId, MemberId};

/// One day of the care rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationEntry {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Day covered.
    pub date: NaiveDate,
    /// Member on duty.
    pub member_id: MemberId,
    /// Free-form note, e.g. "bring groceries".
    pub note: Option<String>,
}

/// Kind of calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Doctor visits and tests.
    Medical,
    /// Shopping trips.
    Shopping,
    /// Family gatherings.
    Family,
    /// Anything else.
    Other,
}

text_enum!(EventCategory {
    Medical => "medical",
    Shopping => "shopping",
    Family => "family",
    Other => "other",
});

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Title.
    pub title: String,
    /// Kind of event.
    pub category: EventCategory,
    /// Local start time.
    pub starts_at: NaiveDateTime,
    /// Member taking care of it.
    pub responsible_member_id: Option<MemberId>,
    /// Shown on the mom display.
    pub visible_to_mother: bool,
}

/// Fields for adding an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Owning family.
    pub family_id: FamilyId,
    /// Title.
    pub title: String,
    /// Kind of event.
    pub category: EventCategory,
    /// Local start time.
    pub starts_at: NaiveDateTime,
    /// Member taking care of it.
    pub responsible_member_id: Option<MemberId>,
    /// Shown on the mom display.
    pub visible_to_mother: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_text() {
        for category in EventCategory::ALL {
            assert_eq!(category.as_str().parse::<EventCategory>().unwrap(), *category);
        }
        assert!("birthday".parse::<EventCategory>().is_err());
    }
}
