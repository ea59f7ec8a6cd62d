//! # Herald Commands
//!
//! Discord command implementations using Poise framework for Herald.
//!
//! This crate wires the scheduling registry and wizard to Discord: text and
//! slash commands, select-menu prompts, the channel delivery used by the
//! registry, and per-command auto-deletion of messages. It also carries the
//! immediate message tools: broadcasts, pins, the archive and sticky messages.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod autodelete;
pub mod broadcast;
pub mod delivery;
pub mod framework;
pub mod pin;
pub mod response_delay;
pub mod schedule;
pub mod scheduled;
pub mod sticky;
pub mod targets;

pub use autodelete::{AutoDeletePolicy, AutoDeleteTable};
pub use delivery::DiscordDelivery;
pub use framework::*;
