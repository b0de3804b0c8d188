//! Families and their members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant boundary; every other record belongs to exactly one family.
pub type FamilyId = i64;

/// Row id of a [`Member`].
pub type MemberId = i64;

/// A family account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    /// Row id.
    pub id: FamilyId,
    /// Display name.
    pub name: String,
    /// When the family was created.
    pub created_at: DateTime<Utc>,
}

/// What a member may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control, including settings and membership.
    Admin,
    /// May edit shared lists and drive the mom display.
    Editor,
    /// Read-only.
    Viewer,
}

text_enum!(Role {
    Admin => "admin",
    Editor => "editor",
    Viewer => "viewer",
});

impl Role {
    /// Admins and editors may write shared records and control the display.
    #[must_use]
    pub const fn can_edit(self) -> bool {
        matches!(self, Self::Admin | Self::Editor)
    }

    /// Only admins may manage members and display settings.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// A person in a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Row id.
    pub id: MemberId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Login identity (e.g. an email address).
    pub user_id: String,
    /// First name shown on screens.
    pub first_name: String,
    /// Permission level.
    pub role: Role,
    /// Selects the simplified mom display instead of the caregiver screens.
    pub is_mother: bool,
    /// Phone number for the "call" button.
    pub phone: Option<String>,
}

/// Fields for creating a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    /// Owning family.
    pub family_id: FamilyId,
    /// Login identity.
    pub user_id: String,
    /// First name.
    pub first_name: String,
    /// Permission level.
    pub role: Role,
    /// Whether this member uses the mom display.
    pub is_mother: bool,
    /// Optional phone number.
    pub phone: Option<String>,
}
