//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Subcommand, ValueEnum};

use crate::model::{
    DisplayView, DoseStatus, EventCategory, Role, ShoppingStatus, TaskStatus, TimeWindow,
};

/// Family and membership commands.
#[derive(Debug, Subcommand)]
pub enum FamilyCommand {
    /// Create a family with yourself as its first admin
    Create {
        /// Family name
        name: String,

        /// Your login identity
        #[arg(long)]
        user: String,

        /// Your first name
        #[arg(long)]
        first_name: String,
    },

    /// Add a member to your family (admin only)
    AddMember {
        /// Login identity of the new member
        user_id: String,

        /// First name shown on screens
        #[arg(long)]
        first_name: String,

        /// Permission level
        #[arg(short, long, value_enum, default_value = "viewer")]
        role: RoleArg,

        /// This member uses the mom display
        #[arg(long)]
        mother: bool,

        /// Phone number for the call button
        #[arg(long)]
        phone: Option<String>,
    },

    /// Change a member's role (admin only)
    SetRole {
        /// Member id
        member_id: i64,

        /// New permission level
        #[arg(value_enum)]
        role: RoleArg,
    },

    /// List your family's members
    Members,
}

/// Display control commands.
#[derive(Debug, Subcommand)]
pub enum ControlCommand {
    /// Switch the mom display to a view
    View {
        /// View to show
        #[arg(value_enum)]
        view: ViewArg,

        /// Tutorial id for the tutorial view
        #[arg(long)]
        content_id: Option<i64>,

        /// Inline text for the message view
        #[arg(long)]
        text: Option<String>,
    },

    /// Put a tutorial on the mom display
    Tutorial {
        /// Tutorial id
        id: i64,
    },

    /// Send a message to the mom display
    Message {
        /// Message text
        text: String,

        /// Pop it up on the display right away
        #[arg(short, long)]
        urgent: bool,
    },

    /// Show what the display has been told to show
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Message commands.
#[derive(Debug, Subcommand)]
pub enum MessagesCommand {
    /// List recent messages, newest first
    List {
        /// Only unread messages
        #[arg(short, long)]
        unread: bool,

        /// Maximum number of messages
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Mark a message read
    Read {
        /// Message id
        id: i64,
    },
}

/// Tutorial library commands.
#[derive(Debug, Subcommand)]
pub enum TutorialCommand {
    /// Add a tutorial (admin only)
    Add {
        /// Title
        title: String,

        /// Video URL; makes this a video tutorial
        #[arg(long, conflicts_with = "steps")]
        video_url: Option<String>,

        /// Image steps as `text` or `text|image_url`, in order
        #[arg(long = "step", value_name = "STEP")]
        steps: Vec<String>,
    },

    /// List tutorials
    List,

    /// Hide a tutorial from the control panel (admin only)
    Disable {
        /// Tutorial id
        id: i64,
    },
}

/// Gallery commands.
#[derive(Debug, Subcommand)]
pub enum PhotoCommand {
    /// Add a photo to the screensaver (admin only)
    Add {
        /// Image URL or path
        url: String,

        /// Caption
        #[arg(long)]
        caption: Option<String>,

        /// Position in the slideshow
        #[arg(long, default_value = "0")]
        order: i64,
    },

    /// List active photos
    List,

    /// Remove a photo from the slideshow (admin only)
    Disable {
        /// Photo id
        id: i64,
    },
}

/// Display settings commands.
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the family's display settings
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Change display settings (admin only)
    Set(SettingsArgs),
}

/// Display settings to change; omitted flags keep their value.
#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Seconds without interaction before the screensaver
    #[arg(long)]
    pub idle_timeout: Option<u32>,

    /// Seconds per photo
    #[arg(long)]
    pub photo_interval: Option<u32>,

    /// Night mode start (HH:MM)
    #[arg(long)]
    pub night_start: Option<String>,

    /// Night mode end (HH:MM)
    #[arg(long)]
    pub night_end: Option<String>,

    /// Turn night mode off
    #[arg(long, conflicts_with_all = ["night_start", "night_end"])]
    pub no_night: bool,
}

/// Caregiving commands.
#[derive(Debug, Subcommand)]
pub enum CareCommand {
    /// Medications
    #[command(subcommand)]
    Med(MedCommand),

    /// Dose logs
    #[command(subcommand)]
    Dose(DoseCommand),

    /// Tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Shopping list
    #[command(subcommand)]
    Shop(ShopCommand),
}

/// Medication commands.
#[derive(Debug, Subcommand)]
pub enum MedCommand {
    /// Add a medication to the schedule
    Add {
        /// Medication name
        name: String,

        /// Dosage, e.g. "1 tablet"
        #[arg(long)]
        dosage: Option<String>,

        /// Part of the day it is due
        #[arg(short, long, value_enum)]
        window: WindowArg,
    },

    /// List scheduled medications
    List,
}

/// Dose log commands.
#[derive(Debug, Subcommand)]
pub enum DoseCommand {
    /// Record a dose outcome
    Log {
        /// Medication id
        medication_id: i64,

        /// Outcome
        #[arg(value_enum)]
        status: DoseStatusArg,

        /// Day of the dose (default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List doses logged on a day
    List {
        /// Day (default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Task commands.
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Member id to assign it to
        #[arg(long)]
        assign: Option<i64>,
    },

    /// Move a task to a new status
    Status {
        /// Task id
        id: i64,

        /// New status
        #[arg(value_enum)]
        status: TaskStatusArg,
    },

    /// List tasks
    List,
}

/// Shopping list commands.
#[derive(Debug, Subcommand)]
pub enum ShopCommand {
    /// Add an item
    Add {
        /// Item name
        name: String,

        /// Quantity, free text
        #[arg(long)]
        quantity: Option<String>,
    },

    /// Mark an item bought or open again
    Status {
        /// Item id
        id: i64,

        /// New status
        #[arg(value_enum)]
        status: ShopStatusArg,
    },

    /// List the shopping list
    List,
}

/// Shared calendar commands.
#[derive(Debug, Subcommand)]
pub enum CalendarCommand {
    /// Put a member on duty for a day
    Assign {
        /// Day to cover
        date: NaiveDate,

        /// Member id
        member_id: i64,

        /// Note for the day
        #[arg(long)]
        note: Option<String>,
    },

    /// Take a day off the rotation
    Unassign {
        /// Day to clear
        date: NaiveDate,
    },

    /// Show who is on duty
    Rotation {
        /// First day (default today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Number of days to show
        #[arg(long, default_value = "14")]
        days: u32,
    },

    /// Add an event
    AddEvent {
        /// Event title
        title: String,

        /// Local start time, `YYYY-MM-DD HH:MM`
        #[arg(long, value_parser = parse_event_time)]
        at: NaiveDateTime,

        /// Kind of event
        #[arg(long, value_enum, default_value = "other")]
        category: CategoryArg,

        /// Member id taking care of it
        #[arg(long)]
        responsible: Option<i64>,

        /// Keep it off the mom display
        #[arg(long)]
        hidden: bool,
    },

    /// List upcoming events
    Events {
        /// Days ahead to look
        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Remove an event
    RemoveEvent {
        /// Event id
        id: i64,
    },
}

/// Parse a local event time with or without seconds.
fn parse_event_time(value: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value.trim(), format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DD HH:MM, got '{value}'"))
}

/// Summary command arguments./// Summary command arguments.
#[derive(Debug, Args)]
pub struct SummaryCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Mom display commands.
#[derive(Debug, Subcommand)]
pub enum DisplayCommand {
    /// Run the mom display, printing each frame as a JSON line
    ///
    /// Reads stdin: `ack` acknowledges the message on screen, `close` closes
    /// a tutorial, any other line counts as activity.
    Run {
        /// Do not ring the terminal bell for urgent messages
        #[arg(long)]
        silent: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Display view argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    /// Normal dashboard
    Dashboard,
    /// A tutorial (needs --content-id)
    Tutorial,
    /// An inline message (needs --text)
    Message,
    /// Photo slideshow
    Screensaver,
}

impl From<ViewArg> for DisplayView {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Dashboard => Self::Dashboard,
            ViewArg::Tutorial => Self::Tutorial,
            ViewArg::Message => Self::Message,
            ViewArg::Screensaver => Self::Screensaver,
        }
    }
}

/// Member role argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Full control
    Admin,
    /// May control the display
    Editor,
    /// Read only
    Viewer,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::Editor => Self::Editor,
            RoleArg::Viewer => Self::Viewer,
        }
    }
}

/// Medication time window argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    /// Morning dose
    Morning,
    /// Evening dose
    Evening,
}

impl From<WindowArg> for TimeWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Morning => Self::Morning,
            WindowArg::Evening => Self::Evening,
        }
    }
}

/// Dose outcome argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DoseStatusArg {
    /// Not given yet
    Pending,
    /// Given on time
    Done,
    /// Given late
    DoneLate,
    /// Not given
    Missed,
}

impl From<DoseStatusArg> for DoseStatus {
    fn from(arg: DoseStatusArg) -> Self {
        match arg {
            DoseStatusArg::Pending => Self::Pending,
            DoseStatusArg::Done => Self::Done,
            DoseStatusArg::DoneLate => Self::DoneLate,
            DoseStatusArg::Missed => Self::Missed,
        }
    }
}

/// Task status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskStatusArg {
    /// Just created
    New,
    /// Someone is on it
    InProgress,
    /// Blocked on someone else
    Waiting,
    /// Done
    Completed,
    /// Dropped
    Cancelled,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(arg: TaskStatusArg) -> Self {
        match arg {
            TaskStatusArg::New => Self::New,
            TaskStatusArg::InProgress => Self::InProgress,
            TaskStatusArg::Waiting => Self::Waiting,
            TaskStatusArg::Completed => Self::Completed,
            TaskStatusArg::Cancelled => Self::Cancelled,
        }
    }
}

/// Shopping item status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShopStatusArg {
    /// Still needed
    Open,
    /// Bought
    Bought,
}

impl From<ShopStatusArg> for ShoppingStatus {
    fn from(arg: ShopStatusArg) -> Self {
        match arg {
            ShopStatusArg::Open => Self::Open,
            ShopStatusArg::Bought => Self::Bought,
        }
    }
}

/// Event category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Doctor visits and tests
    Medical,
    /// Shopping trips
    Shopping,
    /// Family gatherings
    Family,
    /// Anything else
    Other,
}

impl From<CategoryArg> for EventCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Medical => Self::Medical,
            CategoryArg::Shopping => Self::Shopping,
            CategoryArg::Family => Self::Family,
            CategoryArg::Other => Self::Other,
        }
    }
}
