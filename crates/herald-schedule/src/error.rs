//! Error types for scheduling and delivery.

use crate::registry::ScheduleId;
use chrono::{DateTime, Utc};
use herald_common::ChannelId;

/// Rejection of a `schedule` request. Nothing is registered when this is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The requested time is not strictly in the future.
    #[error("scheduled time {fire_at} is not after the current time {now}")]
    InvalidSchedule {
        /// Requested delivery time.
        fire_at: DateTime<Utc>,
        /// Clock reading when the request was checked.
        now: DateTime<Utc>,
    },

    /// The payload has no content.
    #[error("scheduled message payload is empty")]
    EmptyPayload,
}

/// Error returned by a [`Delivery`](crate::Delivery) implementation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The destination no longer exists or cannot be reached.
    #[error("destination {0} is unreachable")]
    Unreachable(ChannelId),

    /// The platform rejected the send.
    #[error("send failed: {0}")]
    Send(String),

    /// The delivery callback panicked.
    #[error("delivery panicked: {0}")]
    Panicked(String),
}

/// A delivery attempt that failed. Reported to the [`ErrorSink`](crate::ErrorSink),
/// never returned to whoever scheduled the message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("scheduled message {id} to channel {destination} failed: {error}")]
pub struct DeliveryFailure {
    /// Id of the entry whose delivery failed.
    pub id: ScheduleId,
    /// Where the payload should have gone.
    pub destination: ChannelId,
    /// What went wrong.
    #[source]
    pub error: DeliveryError,
}
