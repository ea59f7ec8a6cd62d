//! Registry of pending timed sends.
//!
//! Every scheduled entry gets its own tokio task that races the entry's
//! deadline against a cancellation token. The map of pending entries is the
//! single source of truth: a waking task must remove (claim) its entry before
//! delivering, so a task whose entry was cancelled never delivers, and a
//! `cancel` that loses the race to a claim returns `false`.

use crate::clock::{Clock, SystemClock};
use crate::delivery::{Delivery, ErrorSink, TracingErrorSink};
use crate::error::{DeliveryError, DeliveryFailure, ScheduleError};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use herald_common::{ChannelId, UserId};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Identifier of a scheduled send. Starts at 1 and is never reused.
pub type ScheduleId = u64;

/// One requested future delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSend {
    /// Unique identifier.
    pub id: ScheduleId,
    /// Channel that receives the payload.
    pub destination: ChannelId,
    /// User who scheduled the send.
    pub requester: UserId,
    /// Delivery time.
    pub fire_at: DateTime<Utc>,
    /// Message body.
    pub payload: String,
}

struct Entry {
    pending: PendingSend,
    token: CancellationToken,
}

struct Inner {
    entries: Mutex<HashMap<ScheduleId, Entry>>,
    next_id: AtomicU64,
    clock: Arc<dyn Clock>,
    delivery: Arc<dyn Delivery>,
    errors: Arc<dyn ErrorSink>,
}

/// Holds pending sends and delivers each one when its time arrives.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct ScheduleRegistry {
    inner: Arc<Inner>,
}

impl ScheduleRegistry {
    /// Creates a registry using the system clock and logging failed deliveries.
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self::with_parts(Arc::new(SystemClock), delivery, Arc::new(TracingErrorSink))
    }

    /// Creates a registry from explicit collaborators.
    pub fn with_parts(
        clock: Arc<dyn Clock>,
        delivery: Arc<dyn Delivery>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                clock,
                delivery,
                errors,
            }),
        }
    }

    /// The clock the registry validates against.
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Registers a send of `payload` to `destination` at `fire_at`.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::EmptyPayload`] for an empty payload and
    /// [`ScheduleError::InvalidSchedule`] when `fire_at` is not strictly
    /// after the clock's current time. Nothing is registered on error.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn schedule(
        &self,
        destination: ChannelId,
        fire_at: DateTime<Utc>,
        payload: impl Into<String>,
        requester: UserId,
    ) -> Result<PendingSend, ScheduleError> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(ScheduleError::EmptyPayload);
        }

        let now = self.inner.clock.now();
        if fire_at <= now {
            return Err(ScheduleError::InvalidSchedule { fire_at, now });
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = PendingSend {
            id,
            destination,
            requester,
            fire_at,
            payload,
        };
        let token = CancellationToken::new();

        self.inner.entries.lock().insert(
            id,
            Entry {
                pending: pending.clone(),
                token: token.clone(),
            },
        );
        tokio::spawn(wait_and_deliver(Arc::clone(&self.inner), id, fire_at, token));

        info!(
            id,
            destination = %destination,
            requester = %requester,
            fire_at = %fire_at,
            "Scheduled message"
        );
        Ok(pending)
    }

    /// Cancels a pending send.
    ///
    /// Returns `false` when no pending entry has this id: it was never
    /// issued, was already cancelled, or its delivery has already begun.
    pub fn cancel(&self, id: ScheduleId) -> bool {
        let removed = self.inner.entries.lock().remove(&id);
        match removed {
            Some(entry) => {
                entry.token.cancel();
                info!(id, "Cancelled scheduled message");
                true
            }
            None => {
                debug!(id, "No pending scheduled message to cancel");
                false
            }
        }
    }

    /// Snapshot of all pending sends ordered by `fire_at`, then `id`.
    pub fn list(&self) -> Vec<PendingSend> {
        let mut pending: Vec<PendingSend> = self
            .inner
            .entries
            .lock()
            .values()
            .map(|entry| entry.pending.clone())
            .collect();
        pending.sort_by_key(|p| (p.fire_at, p.id));
        pending
    }

    /// Snapshot of one pending send.
    pub fn get(&self, id: ScheduleId) -> Option<PendingSend> {
        self.inner
            .entries
            .lock()
            .get(&id)
            .map(|entry| entry.pending.clone())
    }

    /// Number of pending sends.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Cancels every pending send and returns how many were dropped.
    ///
    /// The registry remains usable afterwards.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<Entry> = self
            .inner
            .entries
            .lock()
            .drain()
            .map(|(_, entry)| entry)
            .collect();

        for entry in &drained {
            entry.token.cancel();
        }
        if !drained.is_empty() {
            warn!(count = drained.len(), "Dropped pending scheduled messages on shutdown");
        }
        drained.len()
    }
}

impl std::fmt::Debug for ScheduleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleRegistry")
            .field("pending", &self.len())
            .field("next_id", &self.inner.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

async fn wait_and_deliver(
    inner: Arc<Inner>,
    id: ScheduleId,
    fire_at: DateTime<Utc>,
    token: CancellationToken,
) {
    tokio::select! {
        biased;
        () = token.cancelled() => {
            debug!(id, "Wait for scheduled message interrupted");
            return;
        }
        () = inner.clock.sleep_until(fire_at) => {}
    }

    let claimed = inner.entries.lock().remove(&id);
    let Some(entry) = claimed else {
        debug!(id, "Scheduled message was cancelled before delivery");
        return;
    };
    let pending = entry.pending;

    let attempt = AssertUnwindSafe(inner.delivery.deliver(pending.destination, &pending.payload))
        .catch_unwind()
        .await;
    let outcome = attempt.unwrap_or_else(|panic| Err(DeliveryError::Panicked(panic_message(&*panic))));

    match outcome {
        Ok(()) => info!(id, destination = %pending.destination, "Delivered scheduled message"),
        Err(error) => inner.errors.report(&DeliveryFailure {
            id,
            destination: pending.destination,
            error,
        }),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
