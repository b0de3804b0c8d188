//! Command-line interface for familyhub.
//!
//! This module provides the CLI structure for the `famhub` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CalendarCommand, CareCommand, CategoryArg, ConfigCommand, ControlCommand, DisplayCommand,
    DoseCommand, DoseStatusArg, FamilyCommand, MedCommand, MessagesCommand, PhotoCommand, RoleArg,
    SettingsArgs, SettingsCommand, ShopCommand, ShopStatusArg, SummaryCommand, TaskCommand,
    TaskStatusArg, TutorialCommand, ViewArg, WindowArg,
};

/// famhub - Keep the family in the loop, and mom's screen in sync
///
/// Shared medications, tasks, shopping and messages for a family, plus a
/// simplified display for mom that caregivers can steer remotely.
#[derive(Debug, Parser)]
#[command(name = "famhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Session token from `famhub login`
    #[arg(long, global = true, env = "FAMILYHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or upgrade the database
    Init,

    /// Manage families and members
    #[command(subcommand)]
    Family(FamilyCommand),

    /// Start a session
    Login {
        /// Login identity, e.g. an email address
        user_id: String,
    },

    /// End the current session
    Logout,

    /// Show who the current session belongs to
    Whoami,

    /// Show how a request for a page would be handled for this session
    Route {
        /// Page path, e.g. /dashboard/admin
        path: String,
    },

    /// Steer the mom display
    #[command(subcommand)]
    Control(ControlCommand),

    /// Read and acknowledge messages
    #[command(subcommand)]
    Messages(MessagesCommand),

    /// Manage tutorials
    #[command(subcommand)]
    Tutorial(TutorialCommand),

    /// Manage screensaver photos
    #[command(subcommand)]
    Photo(PhotoCommand),

    /// View or change display settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Medications, doses, tasks and shopping
    #[command(subcommand)]
    Care(CareCommand),

    /// Care rotation and family events
    #[command(subcommand)]
    Calendar(CalendarCommand),

    /// Show the caregiver dashboard summary
    Summary(SummaryCommand),

    /// Run the mom display
    #[command(subcommand)]
    Display(DisplayCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
