//! Fixed-rate pacing for the orchestration loop.
//!
//! The clock is anchored: ticks come due every `period` after the clock
//! starts, whether or not the loop kept up. A late wake-up reports every
//! tick that came due meanwhile in [`TickInfo::due`], and the host runs
//! them back to back so countdowns and deferred work keep wall-clock
//! timing. Beyond `max_catch_up` ticks the excess is dropped and the clock
//! re-anchors on the present.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. 0 stops the clock.
    pub tick_rate_hz: u32,
    /// Most ticks a single wake-up may report.
    pub max_catch_up: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            max_catch_up: 5,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Self::default()
        }
    }

    /// Clamps the rate to [`Self::MAX_TICK_RATE_HZ`] and lets every wake-up
    /// report at least one tick.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(rate = self.tick_rate_hz, max = Self::MAX_TICK_RATE_HZ, "tick rate clamped");
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.max_catch_up = self.max_catch_up.max(1);
        self
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0).then(|| Duration::from_secs(1) / self.tick_rate_hz)
    }
}

/// What one wake-up of the clock delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Ticks delivered so far, this wake-up included.
    pub tick: u64,
    /// Ticks to run now. At least 1.
    pub due: u64,
    /// Ticks that came due but were dropped past the catch-up limit.
    pub dropped: u64,
}

impl TickInfo {
    /// The loop did not keep up with the rate.
    pub fn is_late(&self) -> bool {
        self.due > 1 || self.dropped > 0
    }
}

pub struct TickClock {
    period: Option<Duration>,
    max_catch_up: u64,
    next_due: Instant,
    delivered: u64,
    paused_at: Option<Instant>,
}

impl TickClock {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let period = config.tick_duration();
        debug!(rate_hz = config.tick_rate_hz, max_catch_up = config.max_catch_up, "tick clock created");
        let now = Instant::now();
        Self {
            period,
            max_catch_up: u64::from(config.max_catch_up),
            next_due: period.map_or(now, |p| now + p),
            delivered: 0,
            paused_at: None,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next due tick.
    ///
    /// Pends forever when the rate is 0 or the clock is paused, so it can
    /// sit in a `tokio::select!` next to a shutdown branch.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let period = match self.period {
            Some(p) if self.paused_at.is_none() => p,
            _ => std::future::pending().await,
        };

        time::sleep_until(self.next_due).await;

        let now = Instant::now();
        let behind = now.saturating_duration_since(self.next_due);
        let came_due = 1 + (behind.as_nanos() / period.as_nanos()) as u64;
        let due = came_due.min(self.max_catch_up);
        let dropped = came_due - due;

        self.delivered += due;
        if dropped > 0 {
            warn!(tick = self.delivered, dropped, "orchestration loop stalled, ticks dropped");
            self.next_due = now + period;
        } else {
            // `due` is bounded by `max_catch_up`, a u32.
            self.next_due += period * due as u32;
        }
        trace!(tick = self.delivered, due, "tick");

        TickInfo {
            tick: self.delivered,
            due,
            dropped,
        }
    }

    /// Stops delivering ticks. Time spent paused is not caught up.
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
            debug!(tick = self.delivered, "tick clock paused");
        }
    }

    pub fn resume(&mut self) {
        if let Some(since) = self.paused_at.take() {
            self.next_due += since.elapsed();
            debug!(tick = self.delivered, "tick clock resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Whether the clock was created with rate 0.
    pub fn is_stopped(&self) -> bool {
        self.period.is_none()
    }

    /// Ticks delivered so far.
    pub fn tick_count(&self) -> u64 {
        self.delivered
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.period
    }
}
