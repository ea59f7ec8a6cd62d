//! Delivery doubles for tests.

use crate::delivery::Delivery;
use crate::error::DeliveryError;
use async_trait::async_trait;
use herald_common::ChannelId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Records every delivery; optionally fails for one payload or one destination.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    calls: Mutex<Vec<(ChannelId, String)>>,
    fail_on: Option<String>,
    unreachable: Option<ChannelId>,
}

impl RecordingDelivery {
    /// A delivery that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A delivery that fails whenever the payload equals `payload`.
    pub fn failing_on(payload: impl Into<String>) -> Self {
        Self {
            fail_on: Some(payload.into()),
            ..Self::default()
        }
    }

    /// A delivery that reports `destination` as unreachable.
    pub fn unreachable_at(destination: ChannelId) -> Self {
        Self {
            unreachable: Some(destination),
            ..Self::default()
        }
    }

    /// Number of delivery attempts so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Payloads in the order they were delivered.
    pub fn payloads(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, p)| p.clone()).collect()
    }

    /// Destination and payload of every attempt.
    pub fn calls(&self) -> Vec<(ChannelId, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(&self, destination: ChannelId, payload: &str) -> Result<(), DeliveryError> {
        self.calls.lock().push((destination, payload.to_string()));
        if self.unreachable == Some(destination) {
            return Err(DeliveryError::Unreachable(destination));
        }
        if self.fail_on.as_deref() == Some(payload) {
            return Err(DeliveryError::Send("rejected by test double".to_string()));
        }
        Ok(())
    }
}

/// Blocks inside `deliver` until released, to observe in-flight deliveries.
#[derive(Debug, Default)]
pub struct GatedDelivery {
    started: Notify,
    gate: Notify,
    completed: AtomicUsize,
}

impl GatedDelivery {
    /// A closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once a delivery has entered the gate.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Lets one waiting delivery finish.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Deliveries that made it through the gate.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Delivery for GatedDelivery {
    async fn deliver(&self, _destination: ChannelId, _payload: &str) -> Result<(), DeliveryError> {
        self.started.notify_one();
        self.gate.notified().await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
