//! Collaborators that deliver payloads and receive failure reports.

use crate::error::{DeliveryError, DeliveryFailure};
use async_trait::async_trait;
use herald_common::ChannelId;
use tracing::error;

/// Sends a payload to its destination once the scheduled time arrives.
#[async_trait]
pub trait Delivery: Send + Sync + 'static {
    /// Delivers `payload` to `destination`.
    async fn deliver(&self, destination: ChannelId, payload: &str) -> Result<(), DeliveryError>;
}

/// Receives reports of failed deliveries.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorSink: Send + Sync + 'static {
    /// Records one failed delivery.
    fn report(&self, failure: &DeliveryFailure);
}

/// Error sink that logs failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, failure: &DeliveryFailure) {
        error!(
            id = failure.id,
            destination = %failure.destination,
            "Failed to send scheduled message: {}",
            failure.error
        );
    }
}
