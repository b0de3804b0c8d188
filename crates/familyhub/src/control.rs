//! Admin control panel: remote control of the mom display.

use tracing::{info, warn};

use crate::auth::{require, Requirement};
use crate::error::{Error, Result};
use crate::hub::FamilyHub;
use crate::model::{
    DisplayControl, DisplayUpdate, DisplayView, InlineMessage, Member, Message, NewMessage,
};

/// Outcome of [`ControlPanel::send_message`].
///
/// The message row and the display push are separate writes. If the push
/// fails the row still exists and `display_push` carries the error.
#[derive(Debug)]
pub struct SentMessage {
    /// The stored message.
    pub message: Message,
    /// Result of the display push; `None` for non-urgent messages.
    pub display_push: Option<Result<DisplayControl>>,
}

impl SentMessage {
    /// Whether every write succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.display_push.as_ref().map_or(true, Result::is_ok)
    }
}

/// Display controls for an admin or editor.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    hub: FamilyHub,
    member: Member,
}

impl ControlPanel {
    /// Open the control panel as `member`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] for viewers.
    pub fn new(hub: FamilyHub, member: Member) -> Result<Self> {
        require(&member, Requirement::Editor)?;
        Ok(Self { hub, member })
    }

    /// The acting member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }

    /// What the display has been told to show.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn status(&self) -> Result<DisplayControl> {
        self.hub.display_control(self.member.family_id)
    }

    /// Overwrite the display-control record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn change_display(
        &self,
        view: DisplayView,
        content_id: Option<i64>,
        content_data: Option<serde_json::Value>,
    ) -> Result<DisplayControl> {
        let update = DisplayUpdate {
            view,
            content_id,
            content_data,
            triggered_by: Some(self.member.id),
        };
        let control = self
            .hub
            .update_display(self.member.family_id, &update)
            .await?;
        info!(
            "{} set the display to {} (v{})",
            self.member.first_name, view, control.version
        );
        Ok(control)
    }

    /// Put one of the family's active tutorials on the display.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing, foreign or inactive tutorial.
    pub async fn show_tutorial(&self, tutorial_id: i64) -> Result<DisplayControl> {
        let tutorial = self.hub.read(|s| s.tutorial(tutorial_id))?;
        match tutorial {
            Some(t) if t.family_id == self.member.family_id && t.is_active => {
                self.change_display(DisplayView::Tutorial, Some(t.id), None)
                    .await
            }
            _ => Err(Error::not_found("tutorial", tutorial_id)),
        }
    }

    /// Send a message to the display.
    ///
    /// Urgent messages are also pushed as a `message` view whose payload
    /// names the stored row, so the display shows a single popup for both.
    ///
    /// # Errors
    ///
    /// Returns an error if the message itself cannot be stored. A failed
    /// display push is reported in [`SentMessage::display_push`].
    pub async fn send_message(&self, text: &str, urgent: bool) -> Result<SentMessage> {
        let message = self
            .hub
            .send_message(&NewMessage {
                family_id: self.member.family_id,
                from_member_id: Some(self.member.id),
                text: text.to_string(),
                is_urgent: urgent,
            })
            .await?;

        if !urgent {
            return Ok(SentMessage {
                message,
                display_push: None,
            });
        }

        let inline = InlineMessage {
            message: message.text.clone(),
            from_member_id: Some(self.member.id),
            message_id: Some(message.id),
            is_urgent: true,
        };
        let push = match serde_json::to_value(&inline) {
            Ok(payload) => {
                self.change_display(DisplayView::Message, None, Some(payload))
                    .await
            }
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &push {
            warn!(
                "Message {} stored but the display push failed: {}",
                message.id, e
            );
        }

        Ok(SentMessage {
            message,
            display_push: Some(push),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{ContentType, FamilyId, NewMember, NewTutorial, Role};

    fn setup(role: Role) -> (FamilyHub, FamilyId, Member) {
        let hub = FamilyHub::in_memory(Config::default()).unwrap();
        let (family_id, member) = hub
            .read(|s| {
                let family = s.create_family("Levi")?;
                let member = s.insert_member(&NewMember {
                    family_id: family.id,
                    user_id: "dana@example.com".to_string(),
                    first_name: "Dana".to_string(),
                    role,
                    is_mother: false,
                    phone: None,
                })?;
                Ok((family.id, member))
            })
            .unwrap();
        (hub, family_id, member)
    }

    fn tutorial(hub: &FamilyHub, family_id: FamilyId) -> i64 {
        hub.read(|s| {
            s.add_tutorial(&NewTutorial {
                family_id,
                title: "Video calls".to_string(),
                content_type: ContentType::Video,
                video_url: Some("https://www.youtube.com/watch?v=abc".to_string()),
                steps: Vec::new(),
            })
        })
        .unwrap()
        .id
    }

    #[test]
    fn test_viewers_cannot_control() {
        let (hub, _, viewer) = setup(Role::Viewer);
        assert!(ControlPanel::new(hub, viewer).unwrap_err().is_forbidden());
    }

    #[tokio::test]
    async fn test_change_display_attributes_member() {
        let (hub, _, editor) = setup(Role::Editor);
        let panel = ControlPanel::new(hub, editor.clone()).unwrap();

        let first = panel
            .change_display(DisplayView::Screensaver, None, None)
            .await
            .unwrap();
        let second = panel
            .change_display(DisplayView::Dashboard, None, None)
            .await
            .unwrap();

        assert_eq!(first.triggered_by, Some(editor.id));
        assert_eq!(second.version, first.version + 1);
        assert_eq!(panel.status().unwrap(), second);
    }

    #[tokio::test]
    async fn test_show_tutorial_checks_row() {
        let (hub, family_id, admin) = setup(Role::Admin);
        let id = tutorial(&hub, family_id);
        let panel = ControlPanel::new(hub.clone(), admin).unwrap();

        let control = panel.show_tutorial(id).await.unwrap();
        assert_eq!(control.current_view, DisplayView::Tutorial);
        assert_eq!(control.content_id, Some(id));

        hub.read(|s| s.set_tutorial_active(id, false)).unwrap();
        assert!(panel.show_tutorial(id).await.unwrap_err().is_not_found());
        assert!(panel.show_tutorial(id + 100).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_regular_message_does_not_push() {
        let (hub, family_id, editor) = setup(Role::Editor);
        let panel = ControlPanel::new(hub.clone(), editor).unwrap();

        let sent = panel.send_message("Lunch is in the fridge", false).await.unwrap();
        assert!(sent.display_push.is_none());
        assert!(sent.is_complete());
        assert_eq!(hub.display_control(family_id).unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_urgent_message_pushes_linked_payload() {
        let (hub, _, editor) = setup(Role::Editor);
        let panel = ControlPanel::new(hub, editor.clone()).unwrap();

        let sent = panel.send_message("Call me now", true).await.unwrap();
        assert!(sent.is_complete());
        let control = sent.display_push.unwrap().unwrap();
        assert_eq!(control.current_view, DisplayView::Message);

        let inline = control.inline_message().unwrap();
        assert_eq!(inline.message, "Call me now");
        assert_eq!(inline.message_id, Some(sent.message.id));
        assert_eq!(inline.from_member_id, Some(editor.id));
    }

    #[tokio::test]
    async fn test_blank_message_rejected_before_push() {
        let (hub, family_id, editor) = setup(Role::Editor);
        let panel = ControlPanel::new(hub.clone(), editor).unwrap();

        assert!(panel.send_message("   ", true).await.is_err());
        assert_eq!(hub.display_control(family_id).unwrap().version, 0);
    }
}
