//! Time sources for the registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Current time and the ability to wait for a future instant.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Suspends until `deadline` has passed. Returns immediately for past deadlines.
    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        let remaining = (deadline - self.now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(remaining).await;
    }
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock driven by the tokio timer.
///
/// Wall time is derived from a fixed anchor plus the elapsed tokio time, so
/// a runtime with paused time (`tokio::time::pause`) advances it too.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor_wall: DateTime<Utc>,
    anchor: tokio::time::Instant,
}

impl TokioClock {
    /// Anchors the clock at `wall` for the current tokio instant.
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall: wall,
            anchor: tokio::time::Instant::now(),
        }
    }

    /// Anchors the clock at the current system time.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.anchor.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor_wall + elapsed
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        let offset = (deadline - self.anchor_wall).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep_until(self.anchor + offset).await;
    }
}
