//! `familyhub` - Family coordination hub with a remotely controlled mom display
//!
//! Caregivers share medications, tasks, shopping and messages. Admins and
//! editors steer a simplified display for the mother through a versioned
//! display-control record; the display reacts to change notifications, idle
//! time and a night window.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod control;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod feed;
pub mod hub;
pub mod logging;
pub mod model;
pub mod retry;
pub mod storage;

pub use auth::{AccessGate, Identity, Requirement, RouteDecision, Session};
pub use config::Config;
pub use control::{ControlPanel, SentMessage};
pub use dashboard::CareSummary;
pub use display::{DisplayMachine, DisplayRunner, Frame, Interaction, Screen};
pub use error::{Error, Result};
pub use feed::{ChangeEvent, ChangeFeed, LocalFeed, PollingFeed, Subscription, Table};
pub use hub::FamilyHub;
pub use logging::init_logging;
pub use storage::Storage;
