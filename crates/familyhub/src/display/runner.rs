//! Drives a [`DisplayMachine`] from the change feed, a tick and user input.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::alert::{play_best_effort, Alerter};
use super::machine::{Acknowledgement, DisplayMachine, Effect, ResolvedContent, Screen};
use super::DisplayPrefs;
use crate::auth::{require, Requirement};
use crate::dashboard::{self, MomDashboard};
use crate::error::Result;
use crate::feed::{ChangeEvent, ChangeFeed, Subscription, Table};
use crate::hub::FamilyHub;
use crate::model::{DisplayControl, DisplayView, Member};
use crate::retry::Backoff;
use crate::storage::Storage;

/// How often photos, display settings and dashboard content are re-read.
const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Local wall-clock time for the display.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A fixed wall time that advances with the tokio clock.
///
/// Under a paused tokio runtime the display's notion of time follows
/// `tokio::time::advance`.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    wall: NaiveDateTime,
    instant: Instant,
}

impl AnchoredClock {
    /// Anchor `wall` to the current tokio instant.
    #[must_use]
    pub fn new(wall: NaiveDateTime) -> Self {
        Self {
            wall,
            instant: Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = chrono::Duration::from_std(self.instant.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall + elapsed
    }
}

/// Local input on the mom display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Pointer, touch or key activity.
    Activity,
    /// The acknowledge button on a message popup.
    Acknowledge,
    /// The close button on a tutorial.
    DismissTutorial,
}

impl Interaction {
    /// Parse one line of terminal input.
    #[must_use]
    pub fn from_line(line: &str) -> Self {
        match line.trim() {
            "ack" => Self::Acknowledge,
            "close" => Self::DismissTutorial,
            _ => Self::Activity,
        }
    }
}

/// Forward interactions read line by line from `reader` until it ends.
///
/// The sender is borrowed, so the end of input does not stop the runner.
/// Returns early if the runner has gone away.
///
/// # Errors
///
/// Returns an error if reading fails.
pub async fn forward_interactions<R>(reader: R, tx: &mpsc::Sender<Interaction>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if tx.send(Interaction::from_line(&line)).await.is_err() {
            debug!("Display runner stopped, no longer reading input");
            break;
        }
    }
    debug!("Input closed");
    Ok(())
}

/// What the display currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// The screen.
    pub screen: Screen,
    /// Set while the change feed is disconnected.
    pub stale_since: Option<NaiveDateTime>,
    /// Last failed action, shown until the next successful one.
    pub error: Option<String>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            screen: Screen::Dashboard {
                content: MomDashboard::default(),
            },
            stale_since: None,
            error: None,
        }
    }
}

/// Everything a display-control record points at.
fn resolve_content(storage: &Storage, control: &DisplayControl) -> Result<ResolvedContent> {
    let tutorial = match (control.current_view, control.content_id) {
        (DisplayView::Tutorial, Some(id)) => storage.tutorial(id)?,
        _ => None,
    };
    let linked_message = match control.inline_message().and_then(|m| m.message_id) {
        Some(id) => storage.message(id)?,
        None => None,
    };
    Ok(ResolvedContent {
        tutorial,
        linked_message,
    })
}

async fn next_event(subscription: &mut Option<Subscription>) -> Option<ChangeEvent> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Runs the mom display for one member.
pub struct DisplayRunner {
    hub: FamilyHub,
    feed: Arc<dyn ChangeFeed>,
    member: Member,
    alerter: Arc<dyn Alerter>,
    clock: Arc<dyn Clock>,
    machine: DisplayMachine,
    subscription: Option<Subscription>,
    backoff: Backoff,
    reconnect_at: Option<Instant>,
    stale_since: Option<NaiveDateTime>,
    error: Option<String>,
    last_refresh: Instant,
    frames: watch::Sender<Frame>,
}

impl fmt::Debug for DisplayRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayRunner")
            .field("member_id", &self.member.id)
            .field("family_id", &self.member.family_id)
            .field("mode", &self.machine.mode())
            .field("connected", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}

impl DisplayRunner {
    /// Prepare a display for `member`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`](crate::Error::Forbidden) unless `member`
    /// is the mother or an admin, or an error if the family's display
    /// settings cannot be read.
    pub fn new(
        hub: FamilyHub,
        feed: Arc<dyn ChangeFeed>,
        member: Member,
        alerter: Arc<dyn Alerter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        require(&member, Requirement::MotherDisplay)?;

        let settings = hub.read(|s| s.display_settings(member.family_id))?;
        let prefs = DisplayPrefs::resolve(&settings, &hub.config().display)?;
        let machine = DisplayMachine::for_member(&member, prefs, clock.now());
        let backoff = Backoff::new(
            Duration::from_millis(hub.config().realtime.reconnect_base_ms),
            Duration::from_millis(hub.config().realtime.reconnect_max_ms),
        );
        let (frames, _) = watch::channel(Frame::default());

        Ok(Self {
            hub,
            feed,
            member,
            alerter,
            clock,
            machine,
            subscription: None,
            backoff,
            reconnect_at: None,
            stale_since: None,
            error: None,
            last_refresh: Instant::now(),
            frames,
        })
    }

    /// Watch the frames the display shows.
    #[must_use]
    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.frames.subscribe()
    }

    /// Run until `inputs` closes.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial read of the display state fails;
    /// later failures are logged and retried.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<Interaction>) -> Result<()> {
        info!(
            "Starting display for {} (family {})",
            self.member.first_name, self.member.family_id
        );
        self.resync()?;
        self.connect().await;
        self.render();

        let mut tick = tokio::time::interval(self.hub.config().tick_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(interaction) => self.handle_input(interaction).await,
                    None => break,
                },
                event = next_event(&mut self.subscription) => self.handle_event(event),
                () = wait_until(self.reconnect_at) => self.connect().await,
                _ = tick.tick() => self.on_tick(),
            }
            self.render();
        }

        info!("Display stopped");
        Ok(())
    }

    async fn connect(&mut self) {
        self.reconnect_at = None;
        let family_id = self.member.family_id;
        match self.feed.subscribe(family_id, Table::DISPLAY).await {
            Ok(subscription) => {
                // Subscribe before re-reading so nothing written in between is missed
                if let Err(e) = self.resync() {
                    warn!("Resync after connect failed: {}", e);
                    self.schedule_reconnect();
                    return;
                }
                self.subscription = Some(subscription);
                self.backoff.reset();
                if self.stale_since.take().is_some() {
                    info!("Display feed reconnected");
                } else {
                    debug!("Display feed connected");
                }
            }
            Err(e) => {
                warn!("Display feed unavailable: {}", e);
                self.schedule_reconnect();
            }
        }
    }

    fn disconnect(&mut self, reason: &str) {
        warn!("Display feed lost: {}", reason);
        self.subscription = None;
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.stale_since.is_none() {
            self.stale_since = Some(self.clock.now());
        }
        let delay = self.backoff.next_delay();
        debug!(
            "Reconnecting in {:?} (attempt {})",
            delay,
            self.backoff.attempts()
        );
        self.reconnect_at = Some(Instant::now() + delay);
    }

    /// Re-read everything the display depends on.
    fn resync(&mut self) -> Result<()> {
        let family_id = self.member.family_id;
        let now = self.clock.now();
        let (control, content, pending, photos, settings, board) = self.hub.read(|s| {
            let control = s
                .display_control(family_id)?
                .unwrap_or_else(|| DisplayControl::initial(family_id));
            let content = resolve_content(s, &control)?;
            Ok((
                control,
                content,
                s.unread_urgent(family_id)?,
                s.active_photos(family_id)?,
                s.display_settings(family_id)?,
                dashboard::load_mom(s, family_id, now)?,
            ))
        })?;
        let prefs = DisplayPrefs::resolve(&settings, &self.hub.config().display)?;

        self.machine.set_prefs(prefs);
        self.machine.set_photos(photos);
        self.machine.set_dashboard(board);
        self.machine.apply_control(control, content, now);
        self.machine.replace_pending(pending);
        self.last_refresh = Instant::now();
        debug!("Display resynced at v{}", self.machine.control_version());
        Ok(())
    }

    fn refresh_content(&mut self) {
        let family_id = self.member.family_id;
        let now = self.clock.now();
        let loaded = self.hub.read(|s| {
            Ok((
                s.active_photos(family_id)?,
                s.display_settings(family_id)?,
                dashboard::load_mom(s, family_id, now)?,
            ))
        });
        let result = loaded.and_then(|(photos, settings, board)| {
            let prefs = DisplayPrefs::resolve(&settings, &self.hub.config().display)?;
            self.machine.set_photos(photos);
            self.machine.set_prefs(prefs);
            self.machine.set_dashboard(board);
            Ok(())
        });
        if let Err(e) = result {
            warn!("Could not refresh photos, settings and dashboard: {}", e);
        }
        self.last_refresh = Instant::now();
    }

    fn handle_event(&mut self, event: Option<ChangeEvent>) {
        let Some(event) = event else {
            self.disconnect("subscription closed");
            return;
        };

        let now = self.clock.now();
        match event {
            ChangeEvent::DisplayControl(control) => {
                if self.machine.is_stale(&control) {
                    debug!("Dropping stale display control v{}", control.version);
                    return;
                }
                match self.hub.read(|s| resolve_content(s, &control)) {
                    Ok(content) => {
                        self.machine.apply_control(control, content, now);
                    }
                    Err(e) => self.disconnect(&format!("could not load pushed content: {e}")),
                }
            }
            ChangeEvent::MessageInserted(message) => self.machine.message_inserted(message, now),
            ChangeEvent::MessageUpdated(message) => self.machine.message_updated(message),
            ChangeEvent::Resync { .. } => {
                if let Err(e) = self.resync() {
                    self.disconnect(&format!("resync failed: {e}"));
                }
            }
        }
    }

    async fn handle_input(&mut self, interaction: Interaction) {
        let now = self.clock.now();
        match interaction {
            Interaction::Activity => self.machine.interact(now),
            Interaction::DismissTutorial => self.machine.dismiss_tutorial(now),
            Interaction::Acknowledge => match self.machine.acknowledge(now) {
                Acknowledgement::MarkRead(id) => {
                    match self.hub.mark_message_read(self.member.family_id, id).await {
                        Ok(_) => {
                            self.machine.confirm_read(id);
                            self.error = None;
                        }
                        Err(e) if e.is_not_found() => {
                            debug!("Message {} is gone, dismissing", id);
                            self.machine.confirm_read(id);
                        }
                        Err(e) => {
                            warn!("Could not mark message {} read: {}", id, e);
                            self.error = Some(format!("Could not mark message as read: {e}"));
                        }
                    }
                }
                Acknowledgement::Dismissed | Acknowledgement::Nothing => {}
            },
        }
    }

    fn on_tick(&mut self) {
        if self.last_refresh.elapsed() >= REFRESH_INTERVAL {
            self.refresh_content();
        }
    }

    fn render(&mut self) {
        let evaluation = self.machine.evaluate(self.clock.now());
        for effect in &evaluation.effects {
            match effect {
                Effect::PlayAlert => play_best_effort(self.alerter.as_ref()),
            }
        }

        let frame = Frame {
            screen: evaluation.screen,
            stale_since: self.stale_since,
            error: self.error.clone(),
        };
        self.frames.send_if_modified(|current| {
            if *current == frame {
                return false;
            }
            *current = frame;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FeedMode};
    use crate::display::ModeKind;
    use crate::error::Error;
    use crate::model::{
        ContentType, DisplayUpdate, EventCategory, FamilyId, NewEvent, NewMember, NewMessage,
        NewPhoto, NewTutorial, Role,
    };
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::task::JoinHandle;

    #[derive(Debug, Default)]
    struct CountingAlerter {
        plays: AtomicUsize,
    }

    impl Alerter for CountingAlerter {
        fn play(&self) -> Result<()> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        hub: FamilyHub,
        family_id: FamilyId,
        mom: Member,
        alerter: Arc<CountingAlerter>,
    }

    fn fixture() -> Fixture {
        crate::logging::init_test_logging();
        let mut config = Config::default();
        config.realtime.mode = FeedMode::Local;
        let hub = FamilyHub::in_memory(config).unwrap();
        let (family_id, mom) = hub
            .read(|s| {
                let family = s.create_family("Levi")?;
                let mom = s.insert_member(&NewMember {
                    family_id: family.id,
                    user_id: "mom@example.com".to_string(),
                    first_name: "Ruth".to_string(),
                    role: Role::Viewer,
                    is_mother: true,
                    phone: None,
                })?;
                Ok((family.id, mom))
            })
            .unwrap();
        Fixture {
            hub,
            family_id,
            mom,
            alerter: Arc::new(CountingAlerter::default()),
        }
    }

    fn wall() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn start(
        fx: &Fixture,
    ) -> (
        watch::Receiver<Frame>,
        mpsc::Sender<Interaction>,
        JoinHandle<Result<()>>,
    ) {
        let runner = DisplayRunner::new(
            fx.hub.clone(),
            fx.hub.change_feed(),
            fx.mom.clone(),
            fx.alerter.clone(),
            Arc::new(AnchoredClock::new(wall())),
        )
        .unwrap();
        let frames = runner.frames();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(runner.run(rx));
        (frames, tx, task)
    }

    async fn wait_for(frames: &mut watch::Receiver<Frame>, pred: impl Fn(&Frame) -> bool) -> Frame {
        loop {
            {
                let frame = frames.borrow_and_update();
                if pred(&frame) {
                    return frame.clone();
                }
            }
            tokio::time::timeout(Duration::from_secs(30), frames.changed())
                .await
                .expect("timed out waiting for frame")
                .expect("runner stopped");
        }
    }

    fn kind(frame: &Frame) -> ModeKind {
        frame.screen.kind()
    }

    #[tokio::test(start_paused = true)]
    async fn test_urgent_message_then_acknowledge() {
        let fx = fixture();
        let (mut frames, tx, task) = start(&fx);

        let sent = fx
            .hub
            .send_message(&NewMessage {
                family_id: fx.family_id,
                from_member_id: None,
                text: "Call Dana back".to_string(),
                is_urgent: true,
            })
            .await
            .unwrap();

        let frame = wait_for(&mut frames, |f| kind(f) == ModeKind::UrgentMessage).await;
        match frame.screen {
            Screen::UrgentMessage { message } => assert_eq!(message.message_id, Some(sent.id)),
            other => panic!("unexpected screen {other:?}"),
        }
        assert!(fx.alerter.plays.load(Ordering::SeqCst) >= 1);

        tx.send(Interaction::Acknowledge).await.unwrap();
        wait_for(&mut frames, |f| kind(f) == ModeKind::Dashboard).await;
        let stored = fx.hub.read(|s| s.message(sent.id)).unwrap().unwrap();
        assert!(stored.is_read);

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tutorial_push_and_dismiss() {
        let fx = fixture();
        let tutorial = fx
            .hub
            .read(|s| {
                s.add_tutorial(&NewTutorial {
                    family_id: fx.family_id,
                    title: "Video calls".to_string(),
                    content_type: ContentType::Video,
                    video_url: Some("https://www.youtube.com/watch?v=abc".to_string()),
                    steps: Vec::new(),
                })
            })
            .unwrap();
        let (mut frames, tx, task) = start(&fx);

        fx.hub
            .update_display(
                fx.family_id,
                &DisplayUpdate {
                    view: DisplayView::Tutorial,
                    content_id: Some(tutorial.id),
                    ..DisplayUpdate::default()
                },
            )
            .await
            .unwrap();
        wait_for(&mut frames, |f| kind(f) == ModeKind::Tutorial).await;

        tx.send(Interaction::DismissTutorial).await.unwrap();
        wait_for(&mut frames, |f| kind(f) == ModeKind::Dashboard).await;

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_and_resyncs_after_disconnect() {
        let fx = fixture();
        fx.hub
            .read(|s| {
                s.add_photo(&NewPhoto {
                    family_id: fx.family_id,
                    url: "beach.jpg".to_string(),
                    caption: None,
                    display_order: 0,
                })
            })
            .unwrap();
        fx.hub.local_feed().set_available(false);
        let (mut frames, tx, task) = start(&fx);

        wait_for(&mut frames, |f| f.stale_since.is_some()).await;

        // Written while disconnected; must be picked up by the resync
        fx.hub
            .update_display(
                fx.family_id,
                &DisplayUpdate {
                    view: DisplayView::Screensaver,
                    ..DisplayUpdate::default()
                },
            )
            .await
            .unwrap();
        fx.hub.local_feed().set_available(true);

        let frame = wait_for(&mut frames, |f| f.stale_since.is_none()).await;
        assert_eq!(kind(&frame), ModeKind::Screensaver);

        fx.hub.local_feed().disconnect_all();
        wait_for(&mut frames, |f| f.stale_since.is_some()).await;
        wait_for(&mut frames, |f| f.stale_since.is_none()).await;

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_acknowledge_keeps_message() {
        let fx = fixture();
        let (mut frames, tx, task) = start(&fx);
        let sent = fx
            .hub
            .send_message(&NewMessage {
                family_id: fx.family_id,
                from_member_id: None,
                text: "Call Dana back".to_string(),
                is_urgent: true,
            })
            .await
            .unwrap();
        wait_for(&mut frames, |f| kind(f) == ModeKind::UrgentMessage).await;

        fx.hub
            .read(|s| {
                s.conn().execute_batch(
                    "CREATE TRIGGER refuse_read BEFORE UPDATE ON messages
                     BEGIN SELECT RAISE(ABORT, 'disk unavailable'); END;",
                )?;
                Ok(())
            })
            .unwrap();
        tx.send(Interaction::Acknowledge).await.unwrap();
        let frame = wait_for(&mut frames, |f| f.error.is_some()).await;
        match frame.screen {
            Screen::UrgentMessage { message } => assert_eq!(message.message_id, Some(sent.id)),
            other => panic!("unexpected screen {other:?}"),
        }
        assert!(!fx.hub.read(|s| s.message(sent.id)).unwrap().unwrap().is_read);

        // Acknowledging again once the write works clears it
        fx.hub
            .read(|s| {
                s.conn().execute_batch("DROP TRIGGER refuse_read")?;
                Ok(())
            })
            .unwrap();
        tx.send(Interaction::Acknowledge).await.unwrap();
        let frame = wait_for(&mut frames, |f| kind(f) == ModeKind::Dashboard).await;
        assert_eq!(frame.error, None);
        assert!(fx.hub.read(|s| s.message(sent.id)).unwrap().unwrap().is_read);

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_acknowledging_push_for_missing_row_dismisses() {
        let fx = fixture();
        let push = DisplayUpdate {
            view: DisplayView::Message,
            content_data: Some(serde_json::json!({"message": "gone", "message_id": 999})),
            ..DisplayUpdate::default()
        };
        fx.hub.update_display(fx.family_id, &push).await.unwrap();
        let (mut frames, tx, task) = start(&fx);

        wait_for(&mut frames, |f| kind(f) == ModeKind::UrgentMessage).await;
        tx.send(Interaction::Acknowledge).await.unwrap();
        let frame = wait_for(&mut frames, |f| kind(f) == ModeKind::Dashboard).await;
        assert_eq!(frame.error, None);

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_shows_rotation_and_refreshes() {
        let fx = fixture();
        fx.hub
            .read(|s| {
                let dana = s.insert_member(&NewMember {
                    family_id: fx.family_id,
                    user_id: "dana@example.com".to_string(),
                    first_name: "Dana".to_string(),
                    role: Role::Editor,
                    is_mother: false,
                    phone: None,
                })?;
                s.set_rotation(fx.family_id, wall().date(), dana.id, None)?;
                Ok(())
            })
            .unwrap();
        let (mut frames, tx, task) = start(&fx);

        let frame = wait_for(&mut frames, |f| {
            matches!(&f.screen, Screen::Dashboard { content } if content.today.is_some())
        })
        .await;
        match frame.screen {
            Screen::Dashboard { content } => {
                assert_eq!(content.today.map(|d| d.first_name), Some("Dana".to_string()));
                assert!(content.upcoming.is_empty());
            }
            other => panic!("unexpected screen {other:?}"),
        }

        fx.hub
            .read(|s| {
                s.add_event(&NewEvent {
                    family_id: fx.family_id,
                    title: "Eye doctor".to_string(),
                    category: EventCategory::Medical,
                    starts_at: wall() + chrono::Duration::hours(3),
                    responsible_member_id: None,
                    visible_to_mother: true,
                })
            })
            .unwrap();
        tokio::time::advance(REFRESH_INTERVAL + Duration::from_secs(1)).await;
        wait_for(&mut frames, |f| {
            matches!(&f.screen, Screen::Dashboard { content } if content.upcoming.len() == 1)
        })
        .await;

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[test]
    fn test_interaction_from_line() {
        assert_eq!(Interaction::from_line(" ack\n"), Interaction::Acknowledge);
        assert_eq!(Interaction::from_line("close"), Interaction::DismissTutorial);
        assert_eq!(Interaction::from_line(""), Interaction::Activity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_survives_end_of_input() {
        let fx = fixture();
        let (mut frames, tx, task) = start(&fx);
        let urgent = NewMessage {
            family_id: fx.family_id,
            from_member_id: None,
            text: "Call Dana back".to_string(),
            is_urgent: true,
        };

        fx.hub.send_message(&urgent).await.unwrap();
        wait_for(&mut frames, |f| kind(f) == ModeKind::UrgentMessage).await;
        forward_interactions(&b"tap\nack\n"[..], &tx).await.unwrap();
        wait_for(&mut frames, |f| kind(f) == ModeKind::Dashboard).await;

        // Input is exhausted but the display keeps following the feed
        fx.hub.send_message(&urgent).await.unwrap();
        wait_for(&mut frames, |f| kind(f) == ModeKind::UrgentMessage).await;
        assert!(!task.is_finished());

        drop(tx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_requires_mother_or_admin() {
        let fx = fixture();
        let editor = fx
            .hub
            .read(|s| {
                s.insert_member(&NewMember {
                    family_id: fx.family_id,
                    user_id: "dana@example.com".to_string(),
                    first_name: "Dana".to_string(),
                    role: Role::Editor,
                    is_mother: false,
                    phone: None,
                })
            })
            .unwrap();

        let err: Error = DisplayRunner::new(
            fx.hub.clone(),
            fx.hub.change_feed(),
            editor,
            Arc::new(crate::display::Silent),
            Arc::new(SystemClock),
        )
        .unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test(start_paused = true)]
    async fn test_anchored_clock_follows_tokio_time() {
        let clock = AnchoredClock::new(wall());
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), wall() + chrono::Duration::seconds(90));
    }
}
