//! Tutorials the family can put on the mom display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::family::FamilyId;

/// How a tutorial is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// A single embedded video.
    Video,
    /// A sequence of captioned steps.
    Images,
}

text_enum!(ContentType {
    Video => "video",
    Images => "images",
});

/// One numbered step of an image tutorial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialStep {
    /// Instruction text.
    pub text: String,
    /// Illustration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Read-only reference content addressed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutorial {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Title shown above the content.
    pub title: String,
    /// Presentation.
    pub content_type: ContentType,
    /// Video link for `video` tutorials.
    pub video_url: Option<String>,
    /// Steps for `images` tutorials.
    pub steps: Vec<TutorialStep>,
    /// Inactive tutorials cannot be shown.
    pub is_active: bool,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

impl Tutorial {
    /// The video link in embeddable form (`watch?v=` becomes `embed/`).
    #[must_use]
    pub fn embed_url(&self) -> Option<String> {
        self.video_url
            .as_deref()
            .map(|url| url.replacen("watch?v=", "embed/", 1))
    }
}

/// Fields for creating a tutorial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTutorial {
    /// Owning family.
    pub family_id: FamilyId,
    /// Title.
    pub title: String,
    /// Presentation.
    pub content_type: ContentType,
    /// Video link.
    pub video_url: Option<String>,
    /// Steps.
    pub steps: Vec<TutorialStep>,
}
