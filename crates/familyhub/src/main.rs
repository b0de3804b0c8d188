//! `famhub` - CLI for familyhub
//!
//! This binary manages families, steers the mom display and runs the display
//! loop itself.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use serde_json::json;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

use familyhub::auth::{AccessGate, Identity, Requirement};
use familyhub::cli::{
    CalendarCommand, CareCommand, Cli, Command, ConfigCommand, ControlCommand, DisplayCommand,
    DoseCommand, FamilyCommand, MedCommand, MessagesCommand, PhotoCommand, SettingsArgs,
    SettingsCommand, ShopCommand, TaskCommand, TutorialCommand,
};
use familyhub::control::ControlPanel;
use familyhub::display::{
    forward_interactions, Alerter, DisplayPrefs, DisplayRunner, Silent, SystemClock, TerminalBell,
};
use familyhub::model::{
    ContentType, DisplayView, Member, Message, NewEvent, NewMedication, NewMember, NewPhoto,
    NewTutorial, Role, TutorialStep,
};
use familyhub::{dashboard, init_logging, Config, FamilyHub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Init => handle_init(config),
        command => {
            let hub = FamilyHub::open(config).context("failed to open the family database")?;
            let app = App {
                gate: AccessGate::new(hub.clone()),
                hub,
                token: cli.token,
            };
            app.dispatch(command).await
        }
    }
}

fn handle_init(config: Config) -> anyhow::Result<()> {
    let hub = FamilyHub::open(config).context("failed to initialize the family database")?;
    println!("Database ready at {}", hub.config().database_path().display());
    Ok(())
}

struct App {
    hub: FamilyHub,
    gate: AccessGate,
    token: Option<String>,
}

impl App {
    /// The session's member, checked against `requirement`.
    fn member(&self, requirement: Requirement) -> anyhow::Result<Member> {
        Ok(self.gate.authorize(self.token.as_deref(), requirement)?)
    }

    async fn dispatch(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Family(cmd) => self.family(cmd).await,
            Command::Login { user_id } => self.login(&user_id).await,
            Command::Logout => self.logout().await,
            Command::Whoami => self.whoami(),
            Command::Route { path } => {
                println!("{}", self.gate.route(self.token.as_deref(), &path)?);
                Ok(())
            }
            Command::Control(cmd) => self.control(cmd).await,
            Command::Messages(cmd) => self.messages(cmd).await,
            Command::Tutorial(cmd) => self.tutorial(cmd).await,
            Command::Photo(cmd) => self.photo(cmd).await,
            Command::Settings(cmd) => self.settings(cmd).await,
            Command::Care(cmd) => self.care(cmd).await,
            Command::Calendar(cmd) => self.calendar(cmd).await,
            Command::Summary(cmd) => self.summary(cmd.json),
            Command::Display(DisplayCommand::Run { silent }) => self.run_display(silent).await,
            Command::Init | Command::Config(_) => Ok(()),
        }
    }

    async fn login(&self, user_id: &str) -> anyhow::Result<()> {
        let session = self.gate.login(user_id).await?;
        println!("{}", session.token);
        eprintln!(
            "Logged in as {} until {}. Export FAMILYHUB_TOKEN or pass --token.",
            session.user_id,
            session.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
        Ok(())
    }

    async fn logout(&self) -> anyhow::Result<()> {
        let Some(token) = self.token.as_deref() else {
            bail!("no session token given");
        };
        if self.gate.logout(token).await? {
            println!("Logged out.");
        } else {
            println!("Session was not active.");
        }
        Ok(())
    }

    fn whoami(&self) -> anyhow::Result<()> {
        match self.gate.identify(self.token.as_deref())? {
            Identity::Anonymous { reason } => println!("Not logged in ({reason})."),
            Identity::Unlisted { user_id } => {
                println!("{user_id} is logged in but not on any family's member list.");
            }
            Identity::Member(member) => {
                let family = self
                    .hub
                    .read(|s| s.family(member.family_id))?
                    .map_or_else(|| member.family_id.to_string(), |f| f.name);
                println!(
                    "{} ({}), {} of family {}{}",
                    member.first_name,
                    member.user_id,
                    member.role,
                    family,
                    if member.is_mother { ", mom display" } else { "" }
                );
            }
        }
        Ok(())
    }

    async fn family(&self, cmd: FamilyCommand) -> anyhow::Result<()> {
        match cmd {
            FamilyCommand::Create {
                name,
                user,
                first_name,
            } => {
                let family = self.hub.write("create_family", |s| s.create_family(&name)).await?;
                let member = NewMember {
                    family_id: family.id,
                    user_id: user,
                    first_name,
                    role: Role::Admin,
                    is_mother: false,
                    phone: None,
                };
                let admin = self
                    .hub
                    .write("insert_member", |s| s.insert_member(&member))
                    .await
                    .with_context(|| format!("family {} created without an admin", family.id))?;
                println!(
                    "Created family {} ({}) with admin {}",
                    family.name, family.id, admin.first_name
                );
            }
            FamilyCommand::AddMember {
                user_id,
                first_name,
                role,
                mother,
                phone,
            } => {
                let admin = self.member(Requirement::Admin)?;
                let member = NewMember {
                    family_id: admin.family_id,
                    user_id,
                    first_name,
                    role: role.into(),
                    is_mother: mother,
                    phone,
                };
                let added = self
                    .hub
                    .write("insert_member", |s| s.insert_member(&member))
                    .await?;
                println!("Added {} as member {}", added.first_name, added.id);
            }
            FamilyCommand::SetRole { member_id, role } => {
                let admin = self.member(Requirement::Admin)?;
                let target = self.hub.read(|s| s.member(member_id))?;
                if target.map(|m| m.family_id) != Some(admin.family_id) {
                    bail!("member {member_id} is not in your family");
                }
                let role: Role = role.into();
                let updated = self
                    .hub
                    .write("set_member_role", |s| s.set_member_role(member_id, role))
                    .await?;
                println!("{} is now {}", updated.first_name, updated.role);
            }
            FamilyCommand::Members => {
                let me = self.member(Requirement::AnyMember)?;
                for member in self.hub.read(|s| s.members(me.family_id))? {
                    println!(
                        "{:>4}  {:<12} {:<8} {}{}",
                        member.id,
                        member.first_name,
                        member.role,
                        member.user_id,
                        if member.is_mother { "  (mom)" } else { "" }
                    );
                }
            }
        }
        Ok(())
    }

    async fn control(&self, cmd: ControlCommand) -> anyhow::Result<()> {
        let panel = ControlPanel::new(self.hub.clone(), self.member(Requirement::AnyMember)?)?;
        match cmd {
            ControlCommand::View {
                view,
                content_id,
                text,
            } => {
                let view: DisplayView = view.into();
                let control = match view {
                    DisplayView::Tutorial => {
                        let Some(id) = content_id else {
                            bail!("the tutorial view needs --content-id");
                        };
                        panel.show_tutorial(id).await?
                    }
                    DisplayView::Message => {
                        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
                            bail!("the message view needs --text");
                        };
                        panel
                            .change_display(view, None, Some(json!({ "message": text })))
                            .await?
                    }
                    DisplayView::Dashboard | DisplayView::Screensaver => {
                        panel.change_display(view, None, None).await?
                    }
                };
                println!("Display set to {} (v{})", control.current_view, control.version);
            }
            ControlCommand::Tutorial { id } => {
                let control = panel.show_tutorial(id).await?;
                println!("Showing tutorial {id} (v{})", control.version);
            }
            ControlCommand::Message { text, urgent } => {
                let sent = panel.send_message(&text, urgent).await?;
                println!("Message {} sent", sent.message.id);
                match sent.display_push {
                    Some(Ok(control)) => println!("Display switched to the message (v{})", control.version),
                    Some(Err(e)) => eprintln!("Message saved, but the display was not switched: {e}"),
                    None => {}
                }
            }
            ControlCommand::Status { json } => {
                let control = panel.status()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&control)?);
                } else {
                    println!("View:     {}", control.current_view);
                    println!("Version:  {}", control.version);
                    if let Some(id) = control.content_id {
                        println!("Content:  {id}");
                    }
                    if let Some(inline) = control.inline_message() {
                        println!("Message:  {}", inline.message);
                    }
                    if control.version > 0 {
                        println!(
                            "Changed:  {}",
                            control.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }
        }
        Ok(())
    }

    async fn messages(&self, cmd: MessagesCommand) -> anyhow::Result<()> {
        let me = self.member(Requirement::AnyMember)?;
        match cmd {
            MessagesCommand::List { unread, limit } => {
                for message in self.hub.read(|s| s.messages(me.family_id, unread, limit))? {
                    print_message(&message);
                }
            }
            MessagesCommand::Read { id } => {
                let message = self.hub.mark_message_read(me.family_id, id).await?;
                print_message(&message);
            }
        }
        Ok(())
    }

    async fn tutorial(&self, cmd: TutorialCommand) -> anyhow::Result<()> {
        match cmd {
            TutorialCommand::Add {
                title,
                video_url,
                steps,
            } => {
                let admin = self.member(Requirement::Admin)?;
                let tutorial = NewTutorial {
                    family_id: admin.family_id,
                    title,
                    content_type: if video_url.is_some() {
                        ContentType::Video
                    } else {
                        ContentType::Images
                    },
                    video_url,
                    steps: steps.iter().map(|step| parse_step(step)).collect(),
                };
                let added = self
                    .hub
                    .write("add_tutorial", |s| s.add_tutorial(&tutorial))
                    .await?;
                println!("Added tutorial {} ({})", added.id, added.title);
            }
            TutorialCommand::List => {
                let me = self.member(Requirement::AnyMember)?;
                for tutorial in self.hub.read(|s| s.tutorials(me.family_id))? {
                    println!(
                        "{:>4}  {:<6} {}{}",
                        tutorial.id,
                        tutorial.content_type,
                        tutorial.title,
                        if tutorial.is_active { "" } else { "  (hidden)" }
                    );
                }
            }
            TutorialCommand::Disable { id } => {
                let admin = self.member(Requirement::Admin)?;
                let owner = self.hub.read(|s| s.tutorial(id))?.map(|t| t.family_id);
                if owner != Some(admin.family_id) {
                    bail!("tutorial {id} not found");
                }
                self.hub
                    .write("set_tutorial_active", |s| s.set_tutorial_active(id, false))
                    .await?;
                println!("Tutorial {id} hidden");
            }
        }
        Ok(())
    }

    async fn photo(&self, cmd: PhotoCommand) -> anyhow::Result<()> {
        match cmd {
            PhotoCommand::Add {
                url,
                caption,
                order,
            } => {
                let admin = self.member(Requirement::Admin)?;
                let photo = NewPhoto {
                    family_id: admin.family_id,
                    url,
                    caption,
                    display_order: order,
                };
                let added = self.hub.write("add_photo", |s| s.add_photo(&photo)).await?;
                println!("Added photo {}", added.id);
            }
            PhotoCommand::List => {
                let me = self.member(Requirement::AnyMember)?;
                for photo in self.hub.read(|s| s.active_photos(me.family_id))? {
                    println!(
                        "{:>4}  {:>3}  {}  {}",
                        photo.id,
                        photo.display_order,
                        photo.url,
                        photo.caption.unwrap_or_default()
                    );
                }
            }
            PhotoCommand::Disable { id } => {
                let admin = self.member(Requirement::Admin)?;
                let owned = self
                    .hub
                    .read(|s| s.active_photos(admin.family_id))?
                    .iter()
                    .any(|p| p.id == id);
                if !owned {
                    bail!("photo {id} not found");
                }
                self.hub
                    .write("set_photo_active", |s| s.set_photo_active(id, false))
                    .await?;
                println!("Photo {id} removed from the slideshow");
            }
        }
        Ok(())
    }

    async fn settings(&self, cmd: SettingsCommand) -> anyhow::Result<()> {
        match cmd {
            SettingsCommand::Show { json } => {
                let me = self.member(Requirement::AnyMember)?;
                let settings = self.hub.read(|s| s.display_settings(me.family_id))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                } else {
                    let prefs = DisplayPrefs::resolve(&settings, &self.hub.config().display)?;
                    println!("Idle timeout:    {}s", prefs.idle_timeout.num_seconds());
                    println!("Photo interval:  {}s", prefs.photo_interval.num_seconds());
                    match prefs.night {
                        Some(night) => println!(
                            "Night mode:      {} - {}",
                            night.start().format("%H:%M"),
                            night.end().format("%H:%M")
                        ),
                        None => println!("Night mode:      off"),
                    }
                }
            }
            SettingsCommand::Set(args) => {
                let admin = self.member(Requirement::Admin)?;
                let mut settings = self.hub.read(|s| s.display_settings(admin.family_id))?;
                apply_settings(&mut settings, args);
                // Reject malformed times before they reach the display
                DisplayPrefs::resolve(&settings, &self.hub.config().display)?;
                self.hub
                    .write("set_display_settings", |s| s.set_display_settings(&settings))
                    .await?;
                println!("Display settings saved");
            }
        }
        Ok(())
    }

    async fn care(&self, cmd: CareCommand) -> anyhow::Result<()> {
        let me = self.member(Requirement::AnyMember)?;
        let family_id = me.family_id;
        match cmd {
            CareCommand::Med(MedCommand::Add {
                name,
                dosage,
                window,
            }) => {
                let medication = NewMedication {
                    family_id,
                    name,
                    dosage,
                    time_window: window.into(),
                };
                let added = self
                    .hub
                    .write("add_medication", |s| s.add_medication(&medication))
                    .await?;
                println!("Added medication {} ({})", added.id, added.name);
            }
            CareCommand::Med(MedCommand::List) => {
                for med in self.hub.read(|s| s.medications(family_id))? {
                    println!(
                        "{:>4}  {:<8} {} {}",
                        med.id,
                        med.time_window,
                        med.name,
                        med.dosage.unwrap_or_default()
                    );
                }
            }
            CareCommand::Dose(DoseCommand::Log {
                medication_id,
                status,
                date,
            }) => {
                let date = date.unwrap_or_else(|| Local::now().date_naive());
                let dose = self
                    .hub
                    .write("log_dose", |s| {
                        s.log_dose(family_id, medication_id, date, status.into(), Some(me.id))
                    })
                    .await?;
                println!(
                    "Logged {} for medication {} on {}",
                    dose.status, dose.medication_id, dose.date
                );
            }
            CareCommand::Dose(DoseCommand::List { date }) => {
                let date = date.unwrap_or_else(|| Local::now().date_naive());
                for dose in self.hub.read(|s| s.doses_on(family_id, date))? {
                    println!(
                        "{:>4}  {:<8} {}",
                        dose.medication_id, dose.time_window, dose.status
                    );
                }
            }
            CareCommand::Task(TaskCommand::Add { title, assign }) => {
                let task = self
                    .hub
                    .write("add_task", |s| s.add_task(family_id, &title, assign))
                    .await?;
                println!("Added task {}", task.id);
            }
            CareCommand::Task(TaskCommand::Status { id, status }) => {
                let task = self
                    .hub
                    .write("set_task_status", |s| {
                        s.set_task_status(family_id, id, status.into())
                    })
                    .await?;
                println!("Task {} is now {}", task.id, task.status);
            }
            CareCommand::Task(TaskCommand::List) => {
                for task in self.hub.read(|s| s.tasks(family_id))? {
                    println!("{:>4}  {:<12} {}", task.id, task.status, task.title);
                }
            }
            CareCommand::Shop(ShopCommand::Add { name, quantity }) => {
                let item = self
                    .hub
                    .write("add_shopping_item", |s| {
                        s.add_shopping_item(family_id, &name, quantity.as_deref())
                    })
                    .await?;
                println!("Added {} to the shopping list", item.name);
            }
            CareCommand::Shop(ShopCommand::Status { id, status }) => {
                let item = self
                    .hub
                    .write("set_shopping_status", |s| {
                        s.set_shopping_status(family_id, id, status.into())
                    })
                    .await?;
                println!("{} is now {}", item.name, item.status);
            }
            CareCommand::Shop(ShopCommand::List) => {
                for item in self.hub.read(|s| s.shopping_items(family_id))? {
                    println!(
                        "{:>4}  {:<7} {} {}",
                        item.id,
                        item.status,
                        item.name,
                        item.quantity.unwrap_or_default()
                    );
                }
            }
        }
        Ok(())
    }

    async fn calendar(&self, cmd: CalendarCommand) -> anyhow::Result<()> {
        let me = self.member(Requirement::AnyMember)?;
        let family_id = me.family_id;
        let today = Local::now().date_naive();
        match cmd {
            CalendarCommand::Assign {
                date,
                member_id,
                note,
            } => {
                let entry = self
                    .hub
                    .write("set_rotation", |s| {
                        s.set_rotation(family_id, date, member_id, note.as_deref())
                    })
                    .await?;
                println!("Member {} on duty {}", entry.member_id, entry.date);
            }
            CalendarCommand::Unassign { date } => {
                let removed = self
                    .hub
                    .write("clear_rotation", |s| s.clear_rotation(family_id, date))
                    .await?;
                if !removed {
                    bail!("nobody is on duty {date}");
                }
                println!("Cleared {date}");
            }
            CalendarCommand::Rotation { from, days } => {
                let from = from.unwrap_or(today);
                let to = from + chrono::Duration::days(i64::from(days.saturating_sub(1)));
                let (entries, members) = self.hub.read(|s| {
                    Ok((s.rotation_between(family_id, from, to)?, s.members(family_id)?))
                })?;
                for entry in entries {
                    let name = members
                        .iter()
                        .find(|m| m.id == entry.member_id)
                        .map_or("?", |m| m.first_name.as_str());
                    println!(
                        "{}  {:<12} {}",
                        entry.date.format("%a %Y-%m-%d"),
                        name,
                        entry.note.unwrap_or_default()
                    );
                }
            }
            CalendarCommand::AddEvent {
                title,
                at,
                category,
                responsible,
                hidden,
            } => {
                let event = NewEvent {
                    family_id,
                    title,
                    category: category.into(),
                    starts_at: at,
                    responsible_member_id: responsible,
                    visible_to_mother: !hidden,
                };
                let added = self
                    .hub
                    .write("add_event", |s| s.add_event(&event))
                    .await?;
                println!("Added event {} ({})", added.id, added.title);
            }
            CalendarCommand::Events { days } => {
                let from = today.and_time(chrono::NaiveTime::MIN);
                let to = from + chrono::Duration::days(i64::from(days));
                let events = self
                    .hub
                    .read(|s| s.events_between(family_id, from, to, false, usize::MAX))?;
                for event in events {
                    println!(
                        "{:>4}  {}  {:<8} {}{}",
                        event.id,
                        event.starts_at.format("%a %Y-%m-%d %H:%M"),
                        event.category,
                        event.title,
                        if event.visible_to_mother { "" } else { "  (hidden)" }
                    );
                }
            }
            CalendarCommand::RemoveEvent { id } => {
                self.hub
                    .write("delete_event", |s| s.delete_event(family_id, id))
                    .await?;
                println!("Removed event {id}");
            }
        }
        Ok(())
    }

    fn summary(&self, json: bool) -> anyhow::Result<()> {
        let me = self.member(Requirement::AnyMember)?;
        let now = Local::now().naive_local();
        let summary = dashboard::load(&self.hub, me.family_id, now.date(), now.time())?;

        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("Today ({})", summary.date);
        match &summary.on_duty {
            Some(duty) => match &duty.note {
                Some(note) => println!("  On duty: {} ({note})", duty.first_name),
                None => println!("  On duty: {}", duty.first_name),
            },
            None => println!("  On duty: nobody scheduled"),
        }
        for progress in &summary.doses {
            println!(
                "  {:<8} {}/{} doses{}",
                progress.window,
                progress.taken,
                progress.scheduled,
                if progress.is_complete() { "  done" } else { "" }
            );
        }
        if !summary.due_now.is_empty() {
            let names: Vec<&str> = summary.due_now.iter().map(|m| m.name.as_str()).collect();
            println!("  Due now: {}", names.join(", "));
        }
        println!("  Open tasks:     {}", summary.open_tasks);
        println!("  Shopping list:  {}", summary.open_shopping);
        if let Some(message) = &summary.latest_unread {
            println!("  Unread: {}", message.text);
        }
        Ok(())
    }

    async fn run_display(&self, silent: bool) -> anyhow::Result<()> {
        let member = self.member(Requirement::MotherDisplay)?;
        let alerter: Arc<dyn Alerter> = if silent {
            Arc::new(Silent)
        } else {
            Arc::new(TerminalBell)
        };
        let runner = DisplayRunner::new(
            self.hub.clone(),
            self.hub.change_feed(),
            member,
            alerter,
            Arc::new(SystemClock),
        )?;

        let mut frames = runner.frames();
        let printer = tokio::spawn(async move {
            loop {
                let line = serde_json::to_string(&*frames.borrow_and_update());
                match line {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("Could not encode frame: {}", e),
                }
                if frames.changed().await.is_err() {
                    break;
                }
            }
        });

        // The sender lives until the display stops, so closing stdin only
        // ends local input.
        let (tx, rx) = mpsc::channel(16);
        let input_tx = tx.clone();
        let input = tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            if let Err(e) = forward_interactions(stdin, &input_tx).await {
                warn!("Could not read display input: {}", e);
            }
        });

        let result = tokio::select! {
            result = runner.run(rx) => result.map_err(anyhow::Error::from),
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                info!("Interrupted");
                Ok(())
            }
        };
        input.abort();
        printer.abort();
        drop(tx);
        result
    }
}

fn print_message(message: &Message) {
    println!(
        "{:>4}  {}  {}{}{}",
        message.id,
        message.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        if message.is_urgent { "[urgent] " } else { "" },
        message.text,
        if message.is_read { "" } else { "  (unread)" }
    );
}

/// Parse `text` or `text|image_url`.
fn parse_step(step: &str) -> TutorialStep {
    match step.split_once('|') {
        Some((text, url)) if !url.trim().is_empty() => TutorialStep {
            text: text.trim().to_string(),
            image_url: Some(url.trim().to_string()),
        },
        _ => TutorialStep {
            text: step.trim_end_matches('|').trim().to_string(),
            image_url: None,
        },
    }
}

fn apply_settings(settings: &mut familyhub::model::DisplaySettings, args: SettingsArgs) {
    if let Some(idle) = args.idle_timeout {
        settings.idle_timeout_secs = Some(idle);
    }
    if let Some(interval) = args.photo_interval {
        settings.photo_interval_secs = Some(interval);
    }
    if args.no_night {
        settings.night_mode_start = None;
        settings.night_mode_end = None;
    }
    if let Some(start) = args.night_start {
        settings.night_mode_start = Some(start);
    }
    if let Some(end) = args.night_end {
        settings.night_mode_end = Some(end);
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Display]");
                println!("  Idle timeout (s):   {}", config.display.idle_timeout_secs);
                println!("  Photo interval (s): {}", config.display.photo_interval_secs);
                println!(
                    "  Night mode:         {} - {}",
                    config.display.night_mode_start.as_deref().unwrap_or("unset"),
                    config.display.night_mode_end.as_deref().unwrap_or("unset")
                );
                println!();
                println!("[Realtime]");
                println!("  Feed mode:          {:?}", config.realtime.mode);
                println!(
                    "  Reconnect (ms):     {} - {}",
                    config.realtime.reconnect_base_ms, config.realtime.reconnect_max_ms
                );
                println!();
                println!("[Retry]");
                println!("  Max attempts:       {}", config.retry.max_attempts);
                println!();
                println!("[Auth]");
                println!("  Session TTL (h):    {}", config.auth.session_ttl_hours);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step() {
        assert_eq!(
            parse_step("Tap the green phone | https://img/1.png"),
            TutorialStep {
                text: "Tap the green phone".to_string(),
                image_url: Some("https://img/1.png".to_string()),
            }
        );
        assert_eq!(parse_step("Wait for Dana").image_url, None);
    }

    #[test]
    fn test_apply_settings_keeps_unset_fields() {
        let mut settings = familyhub::model::DisplaySettings {
            family_id: 1,
            idle_timeout_secs: Some(120),
            night_mode_start: Some("22:00".to_string()),
            night_mode_end: Some("06:00".to_string()),
            ..Default::default()
        };
        apply_settings(
            &mut settings,
            SettingsArgs {
                idle_timeout: None,
                photo_interval: Some(15),
                night_start: None,
                night_end: None,
                no_night: true,
            },
        );
        assert_eq!(settings.idle_timeout_secs, Some(120));
        assert_eq!(settings.photo_interval_secs, Some(15));
        assert_eq!(settings.night_mode_start, None);
    }
}
