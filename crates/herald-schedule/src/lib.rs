//! # Herald Schedule
//!
//! Timed message delivery for Herald.
//!
//! The [`ScheduleRegistry`] holds pending sends, each backed by a background
//! task that waits for its deadline and hands the payload to an injected
//! [`Delivery`]. The [`ScheduleWizard`] is the platform-independent state
//! machine behind the interactive "schedule a message" flow.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod delivery;
pub mod error;
pub mod registry;
pub mod wizard;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::*;
pub use delivery::*;
pub use error::*;
pub use registry::*;
pub use wizard::*;
