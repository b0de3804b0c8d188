//! The mom display state machine.
//!
//! The machine owns no I/O. Callers feed it display-control records (with the
//! tutorial and message rows they refer to already looked up), message
//! changes and interaction, and call [`DisplayMachine::evaluate`] on every
//! tick and after every input.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use tracing::{debug, info};

use super::idle::IdleTimer;
use super::mode::{resolve, ModeInputs, ModeKind};
use super::slideshow::Slideshow;
use super::DisplayPrefs;
use crate::dashboard::MomDashboard;
use crate::model::{
    DisplayControl, DisplayView, FamilyId, InlineMessage, Member, MemberId, Message, Photo,
    Tutorial,
};

/// A message as shown in the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageCard {
    /// Persisted row, if the message has one.
    pub message_id: Option<i64>,
    /// Body text.
    pub text: String,
    /// Sender.
    pub from_member_id: Option<MemberId>,
}

/// What is on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Screen {
    /// Large clock.
    Night {
        /// Time shown, to the minute.
        time: NaiveTime,
    },
    /// Photo slideshow.
    Screensaver {
        /// Current photo.
        photo: Photo,
    },
    /// Tutorial viewer.
    Tutorial {
        /// Tutorial shown.
        tutorial: Tutorial,
    },
    /// Message popup.
    UrgentMessage {
        /// Message shown.
        message: MessageCard,
    },
    /// Normal dashboard.
    Dashboard {
        /// Doses, rotation and upcoming events.
        content: MomDashboard,
    },
}

impl Screen {
    /// The mode this screen belongs to.
    #[must_use]
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Night { .. } => ModeKind::Night,
            Self::Screensaver { .. } => ModeKind::Screensaver,
            Self::Tutorial { .. } => ModeKind::Tutorial,
            Self::UrgentMessage { .. } => ModeKind::UrgentMessage,
            Self::Dashboard { .. } => ModeKind::Dashboard,
        }
    }
}

/// Side effects requested by an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Play the notification sound.
    PlayAlert,
}

/// Result of [`DisplayMachine::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// What to show.
    pub screen: Screen,
    /// Effects to run, best effort.
    pub effects: Vec<Effect>,
}

/// Rows a display-control record refers to, looked up by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContent {
    /// Tutorial named by `content_id`.
    pub tutorial: Option<Tutorial>,
    /// Message row named by the inline payload's `message_id`.
    pub linked_message: Option<Message>,
}

/// Outcome of [`DisplayMachine::acknowledge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// No message was on screen.
    Nothing,
    /// An ad-hoc inline message was dismissed; nothing to persist.
    Dismissed,
    /// The message row must be marked read.
    MarkRead(i64),
}

/// Mom display state.
#[derive(Debug, Clone)]
pub struct DisplayMachine {
    family_id: FamilyId,
    control: DisplayControl,
    tutorial: Option<Tutorial>,
    tutorial_dismissed: bool,
    inline: Option<InlineMessage>,
    inline_dismissed: bool,
    screensaver_dismissed: bool,
    pending: Vec<Message>,
    dashboard: MomDashboard,
    night: Option<super::NightWindow>,
    idle: IdleTimer,
    slideshow: Slideshow,
    mode: Option<ModeKind>,
    alert_requested: bool,
}

impl DisplayMachine {
    /// Create a machine showing the dashboard, with the idle timer starting at `now`.
    #[must_use]
    pub fn new(family_id: FamilyId, prefs: DisplayPrefs, now: NaiveDateTime) -> Self {
        Self {
            family_id,
            control: DisplayControl::initial(family_id),
            tutorial: None,
            tutorial_dismissed: false,
            inline: None,
            inline_dismissed: false,
            screensaver_dismissed: false,
            pending: Vec::new(),
            dashboard: MomDashboard::default(),
            night: prefs.night,
            idle: IdleTimer::new(prefs.idle_timeout, now),
            slideshow: Slideshow::new(Vec::new(), prefs.photo_interval),
            mode: None,
            alert_requested: false,
        }
    }

    /// Create a machine for the family of `member`.
    #[must_use]
    pub fn for_member(member: &Member, prefs: DisplayPrefs, now: NaiveDateTime) -> Self {
        Self::new(member.family_id, prefs, now)
    }

    /// The family this display belongs to.
    #[must_use]
    pub fn family_id(&self) -> FamilyId {
        self.family_id
    }

    /// Version of the last applied display-control record.
    #[must_use]
    pub fn control_version(&self) -> u64 {
        self.control.version
    }

    /// Mode chosen by the last evaluation.
    #[must_use]
    pub fn mode(&self) -> Option<ModeKind> {
        self.mode
    }

    /// Whether `control` would be discarded as stale or foreign.
    #[must_use]
    pub fn is_stale(&self, control: &DisplayControl) -> bool {
        control.family_id != self.family_id || !control.is_newer_than(&self.control)
    }

    /// Apply a display-control record. Returns `false` if it was stale.
    pub fn apply_control(
        &mut self,
        control: DisplayControl,
        content: ResolvedContent,
        now: NaiveDateTime,
    ) -> bool {
        if self.is_stale(&control) {
            debug!(
                "Ignoring display control v{} (have v{})",
                control.version, self.control.version
            );
            return false;
        }

        self.tutorial = match (control.current_view, content.tutorial) {
            (DisplayView::Tutorial, Some(tutorial))
                if Some(tutorial.id) == control.content_id
                    && tutorial.family_id == self.family_id
                    && tutorial.is_active =>
            {
                Some(tutorial)
            }
            _ => None,
        };
        self.inline = control.inline_message();
        // A push naming an already-read message is treated as acknowledged
        self.inline_dismissed = match (&self.inline, &content.linked_message) {
            (Some(inline), Some(message)) => {
                inline.message_id == Some(message.id) && message.is_read
            }
            _ => false,
        };
        self.tutorial_dismissed = false;
        self.screensaver_dismissed = false;
        if self.inline.is_some() && !self.inline_dismissed {
            self.alert_requested = true;
        }

        debug!(
            "Applied display control v{}: {}",
            control.version, control.current_view
        );
        self.control = control;
        self.idle.touch(now);
        true
    }

    /// A message was sent to the family.
    pub fn message_inserted(&mut self, message: Message, now: NaiveDateTime) {
        if message.family_id != self.family_id || !message.is_pending_urgent() {
            return;
        }
        if self.pending.iter().any(|m| m.id == message.id) {
            return;
        }
        // Already acknowledged through its inline push; the read update is in flight
        let acknowledged = self.inline_dismissed
            && self
                .inline
                .as_ref()
                .is_some_and(|inline| inline.message_id == Some(message.id));
        if acknowledged {
            return;
        }
        self.pending.push(message);
        self.pending.sort_by_key(|m| m.id);
        self.alert_requested = true;
        self.idle.touch(now);
    }

    /// A message changed.
    pub fn message_updated(&mut self, message: Message) {
        if message.family_id != self.family_id {
            return;
        }
        if message.is_read {
            self.pending.retain(|m| m.id != message.id);
            if self
                .inline
                .as_ref()
                .is_some_and(|inline| inline.message_id == Some(message.id))
            {
                self.inline_dismissed = true;
            }
        } else if message.is_urgent && !self.pending.iter().any(|m| m.id == message.id) {
            self.pending.push(message);
            self.pending.sort_by_key(|m| m.id);
        }
    }

    /// Replace the unread urgent messages with a fresh read of the store.
    pub fn replace_pending(&mut self, messages: Vec<Message>) {
        let before: Vec<i64> = self.pending.iter().map(|m| m.id).collect();
        self.pending = messages
            .into_iter()
            .filter(|m| m.family_id == self.family_id && m.is_pending_urgent())
            .collect();
        self.pending.sort_by_key(|m| m.id);
        if self.pending.iter().any(|m| !before.contains(&m.id)) {
            self.alert_requested = true;
        }
        if let Some(id) = self.inline.as_ref().and_then(|inline| inline.message_id) {
            if !self.pending.iter().any(|m| m.id == id) && before.contains(&id) {
                self.inline_dismissed = true;
            }
        }
    }

    /// Replace what the dashboard screen shows.
    pub fn set_dashboard(&mut self, content: MomDashboard) {
        self.dashboard = content;
    }

    /// Replace the photos the screensaver rotates through.
    pub fn set_photos(&mut self, photos: Vec<Photo>) {
        self.slideshow.set_photos(photos);
    }

    /// Apply new timing.
    pub fn set_prefs(&mut self, prefs: DisplayPrefs) {
        self.idle.set_timeout(prefs.idle_timeout);
        self.slideshow.set_interval(prefs.photo_interval);
        self.night = prefs.night;
    }

    /// Local pointer, touch or key activity.
    pub fn interact(&mut self, now: NaiveDateTime) {
        self.idle.interact(now);
        if self.control.current_view == DisplayView::Screensaver {
            self.screensaver_dismissed = true;
        }
    }

    /// Close the tutorial until the next display-control change.
    pub fn dismiss_tutorial(&mut self, now: NaiveDateTime) {
        self.idle.interact(now);
        self.tutorial_dismissed = true;
    }

    /// Acknowledge the message on screen.
    ///
    /// A persisted message stays pending until the caller has written the
    /// read flag and calls [`DisplayMachine::confirm_read`]; if that write
    /// fails the popup remains.
    pub fn acknowledge(&mut self, now: NaiveDateTime) -> Acknowledgement {
        self.idle.interact(now);

        if let Some(message) = self.pending.first() {
            return Acknowledgement::MarkRead(message.id);
        }

        if self.control.current_view == DisplayView::Message && !self.inline_dismissed {
            if let Some(inline) = &self.inline {
                return match inline.message_id {
                    Some(id) => Acknowledgement::MarkRead(id),
                    None => {
                        self.inline_dismissed = true;
                        Acknowledgement::Dismissed
                    }
                };
            }
        }
        Acknowledgement::Nothing
    }

    /// The read flag of message `id` was written.
    pub fn confirm_read(&mut self, id: i64) {
        self.pending.retain(|m| m.id != id);
        if self
            .inline
            .as_ref()
            .is_some_and(|inline| inline.message_id == Some(id))
        {
            self.inline_dismissed = true;
        }
    }

    /// Decide what to show at `now`.
    pub fn evaluate(&mut self, now: NaiveDateTime) -> Evaluation {
        let night_active = self
            .night
            .is_some_and(|window| window.contains(now.time()))
            && !self.idle.is_awake(now);

        let inputs = ModeInputs {
            urgent_pending: !self.pending.is_empty(),
            remote_view: self.control.current_view,
            tutorial_resolved: self.tutorial.is_some() && !self.tutorial_dismissed,
            inline_message: self.inline.is_some() && !self.inline_dismissed,
            screensaver_dismissed: self.screensaver_dismissed,
            idle_elapsed: self.idle.is_idle(now),
            night_active,
            has_photos: self.slideshow.has_photos(),
        };
        let kind = resolve(&inputs);

        if kind == ModeKind::Screensaver {
            self.slideshow.start(now);
        } else {
            self.slideshow.stop();
        }

        let screen = self.screen_for(kind, now);
        let mut effects = Vec::new();
        let kind = screen.kind();
        if kind == ModeKind::UrgentMessage
            && (self.mode != Some(ModeKind::UrgentMessage) || self.alert_requested)
        {
            effects.push(Effect::PlayAlert);
        }
        self.alert_requested = false;

        if self.mode != Some(kind) {
            info!("Display mode changed to {}", kind);
            self.mode = Some(kind);
        }

        Evaluation { screen, effects }
    }

    fn screen_for(&self, kind: ModeKind, now: NaiveDateTime) -> Screen {
        match kind {
            ModeKind::UrgentMessage => {
                let card = self
                    .pending
                    .first()
                    .map(|message| MessageCard {
                        message_id: Some(message.id),
                        text: message.text.clone(),
                        from_member_id: message.from_member_id,
                    })
                    .or_else(|| {
                        self.inline.as_ref().map(|inline| MessageCard {
                            message_id: inline.message_id,
                            text: inline.message.clone(),
                            from_member_id: inline.from_member_id,
                        })
                    });
                card.map_or_else(
                    || self.dashboard_screen(),
                    |message| Screen::UrgentMessage { message },
                )
            }
            ModeKind::Tutorial => self
                .tutorial
                .clone()
                .map_or_else(|| self.dashboard_screen(), |tutorial| Screen::Tutorial { tutorial }),
            ModeKind::Screensaver => self
                .slideshow
                .current(now)
                .cloned()
                .map_or_else(|| self.dashboard_screen(), |photo| Screen::Screensaver { photo }),
            ModeKind::Night => Screen::Night {
                time: now
                    .time()
                    .with_second(0)
                    .and_then(|t| t.with_nanosecond(0))
                    .unwrap_or_else(|| now.time()),
            },
            ModeKind::Dashboard => self.dashboard_screen(),
        }
    }

    fn dashboard_screen(&self) -> Screen {
        Screen::Dashboard {
            content: self.dashboard.clone(),
        }
    }
}
