//! End-to-end flows between a controller and the mom display.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{mpsc, watch};

use familyhub::config::{Config, FeedMode};
use familyhub::display::{AnchoredClock, ModeKind, Silent};
use familyhub::model::{
    ContentType, DisplayView, FamilyId, Member, NewMember, NewPhoto, NewTutorial, Role,
};
use familyhub::{AccessGate, ControlPanel, DisplayRunner, FamilyHub, Frame, Interaction, Requirement, Screen};

struct TempDb(PathBuf);

impl TempDb {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("familyhub-{}.db", uuid::Uuid::new_v4())))
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

fn config(db: &TempDb, mode: FeedMode) -> Config {
    let mut config = Config::default();
    config.storage.database_path = Some(db.0.clone());
    config.realtime.mode = mode;
    config.realtime.poll_interval_ms = 20;
    config.realtime.reconnect_base_ms = 50;
    config.display.tick_interval_ms = 50;
    config
}

fn member(hub: &FamilyHub, family_id: FamilyId, user_id: &str, role: Role, is_mother: bool) -> Member {
    hub.read(|s| {
        s.insert_member(&NewMember {
            family_id,
            user_id: user_id.to_string(),
            first_name: user_id.split('@').next().unwrap_or(user_id).to_string(),
            role,
            is_mother,
            phone: None,
        })
    })
    .unwrap()
}

fn wall() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 14)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

async fn wait_for(frames: &mut watch::Receiver<Frame>, pred: impl Fn(&Frame) -> bool) -> Frame {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let frame = frames.borrow_and_update();
                if pred(&frame) {
                    return frame.clone();
                }
            }
            frames.changed().await.expect("display stopped");
        }
    })
    .await
    .expect("timed out waiting for frame")
}

#[tokio::test]
async fn test_controller_and_display_share_a_database_file() {
    let db = TempDb::new();
    // Two hubs on one file stand in for two processes
    let controller_hub = FamilyHub::open(config(&db, FeedMode::Poll)).unwrap();
    let display_hub = FamilyHub::open(config(&db, FeedMode::Poll)).unwrap();

    let family_id = controller_hub.read(|s| s.create_family("Levi")).unwrap().id;
    let editor = member(&controller_hub, family_id, "dana@example.com", Role::Editor, false);
    let mom = member(&controller_hub, family_id, "ruth@example.com", Role::Viewer, true);

    let runner = DisplayRunner::new(
        display_hub.clone(),
        display_hub.change_feed(),
        mom,
        Arc::new(Silent),
        Arc::new(AnchoredClock::new(wall())),
    )
    .unwrap();
    let mut frames = runner.frames();
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(runner.run(rx));

    let panel = ControlPanel::new(controller_hub.clone(), editor).unwrap();
    let sent = panel.send_message("Dana is on her way", true).await.unwrap();
    assert!(sent.is_complete());

    // Row and push arrive separately but show as one popup
    let frame = wait_for(&mut frames, |f| f.screen.kind() == ModeKind::UrgentMessage).await;
    match frame.screen {
        Screen::UrgentMessage { message } => {
            assert_eq!(message.message_id, Some(sent.message.id));
            assert_eq!(message.text, "Dana is on her way");
        }
        other => panic!("unexpected screen {other:?}"),
    }

    tx.send(Interaction::Acknowledge).await.unwrap();
    wait_for(&mut frames, |f| f.screen.kind() == ModeKind::Dashboard).await;

    let stored = controller_hub
        .read(|s| s.message(sent.message.id))
        .unwrap()
        .unwrap();
    assert!(stored.is_read);
    assert!(stored.read_at.is_some());

    drop(tx);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_tutorial_then_screensaver_push() {
    let db = TempDb::new();
    let hub = FamilyHub::open(config(&db, FeedMode::Local)).unwrap();
    let family_id = hub.read(|s| s.create_family("Levi")).unwrap().id;
    let admin = member(&hub, family_id, "dana@example.com", Role::Admin, false);
    let tutorial = hub
        .read(|s| {
            s.add_tutorial(&NewTutorial {
                family_id,
                title: "Answering video calls".to_string(),
                content_type: ContentType::Video,
                video_url: Some("https://www.youtube.com/watch?v=abc123".to_string()),
                steps: Vec::new(),
            })
        })
        .unwrap();
    hub.read(|s| {
        s.add_photo(&NewPhoto {
            family_id,
            url: "grandkids.jpg".to_string(),
            caption: Some("Passover".to_string()),
            display_order: 1,
        })
    })
    .unwrap();

    // Admins may preview the mom display
    let runner = DisplayRunner::new(
        hub.clone(),
        hub.change_feed(),
        admin.clone(),
        Arc::new(Silent),
        Arc::new(AnchoredClock::new(wall())),
    )
    .unwrap();
    let mut frames = runner.frames();
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(runner.run(rx));

    let panel = ControlPanel::new(hub.clone(), admin).unwrap();
    panel.show_tutorial(tutorial.id).await.unwrap();
    let frame = wait_for(&mut frames, |f| f.screen.kind() == ModeKind::Tutorial).await;
    match frame.screen {
        Screen::Tutorial { tutorial } => assert_eq!(
            tutorial.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        ),
        other => panic!("unexpected screen {other:?}"),
    }

    panel
        .change_display(DisplayView::Screensaver, None, None)
        .await
        .unwrap();
    let frame = wait_for(&mut frames, |f| f.screen.kind() == ModeKind::Screensaver).await;
    match frame.screen {
        Screen::Screensaver { photo } => assert_eq!(photo.url, "grandkids.jpg"),
        other => panic!("unexpected screen {other:?}"),
    }

    // Touching the screen dismisses a pushed screensaver
    tx.send(Interaction::Activity).await.unwrap();
    wait_for(&mut frames, |f| f.screen.kind() == ModeKind::Dashboard).await;

    drop(tx);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_session_gates_the_control_panel() {
    let db = TempDb::new();
    let hub = FamilyHub::open(config(&db, FeedMode::Local)).unwrap();
    let family_id = hub.read(|s| s.create_family("Levi")).unwrap().id;
    member(&hub, family_id, "viewer@example.com", Role::Viewer, false);
    member(&hub, family_id, "editor@example.com", Role::Editor, false);
    let gate = AccessGate::new(hub.clone());

    let viewer = gate.login("viewer@example.com").await.unwrap();
    let member = gate
        .authorize(Some(&viewer.token), Requirement::AnyMember)
        .unwrap();
    assert!(ControlPanel::new(hub.clone(), member).unwrap_err().is_forbidden());

    let editor = gate.login("editor@example.com").await.unwrap();
    let member = gate
        .authorize(Some(&editor.token), Requirement::Editor)
        .unwrap();
    let panel = ControlPanel::new(hub.clone(), member).unwrap();
    assert_eq!(
        panel
            .change_display(DisplayView::Dashboard, None, None)
            .await
            .unwrap()
            .version,
        1
    );

    assert!(gate.logout(&editor.token).await.unwrap());
    assert!(gate
        .authorize(Some(&editor.token), Requirement::Editor)
        .unwrap_err()
        .is_unauthenticated());
}
