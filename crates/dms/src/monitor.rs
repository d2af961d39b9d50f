//! Eye-absence tracking

use std::time::Duration;

/// Tracks when eyes were last seen and derives the drowsiness alert.
///
/// Timestamps are offsets from the start of the stream. The alert is a pure
/// function of the last-seen time and the query time; it is never stored.
#[derive(Debug, Clone)]
pub struct DrowsinessMonitor {
    threshold: Duration,
    last_seen_at: Duration,
}

impl DrowsinessMonitor {
    /// Create a monitor whose absence timer starts at `created_at`.
    pub fn new(threshold: Duration, created_at: Duration) -> Self {
        Self {
            threshold,
            last_seen_at: created_at,
        }
    }

    /// Record one frame. Only a frame with visible eyes changes state.
    pub fn record_frame(&mut self, eyes_visible: bool, now: Duration) {
        if eyes_visible {
            self.last_seen_at = now;
        }
    }

    /// Whether eyes have been absent for at least the threshold at `now`.
    pub fn is_alerting(&self, now: Duration) -> bool {
        self.since_last_seen(now) >= self.threshold
    }

    /// Time elapsed since eyes were last seen; zero if `now` precedes it.
    pub fn since_last_seen(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_seen_at)
    }

    pub fn last_seen_at(&self) -> Duration {
        self.last_seen_at
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Restart the absence timer (on stream restart)
    pub fn reset(&mut self, now: Duration) {
        self.last_seen_at = now;
    }
}
