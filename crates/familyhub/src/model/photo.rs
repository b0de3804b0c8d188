//! Gallery photos rotated by the screensaver.

use serde::{Deserialize, Serialize};

use super::family::FamilyId;

/// A family photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Image location.
    pub url: String,
    /// Optional caption.
    pub caption: Option<String>,
    /// Rotation order, ascending.
    pub display_order: i64,
    /// Inactive photos are skipped.
    pub is_active: bool,
}

/// Fields for adding a photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    /// Owning family.
    pub family_id: FamilyId,
    /// Image location.
    pub url: String,
    /// Optional caption.
    pub caption: Option<String>,
    /// Rotation order.
    pub display_order: i64,
}
