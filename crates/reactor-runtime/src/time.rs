//! Clock source with wall-clock-jump correction.
//!
//! Mirrors the original reactor's `detect_monotonic`/`gettime`/
//! `timeout_correct`: prefer a monotonic clock source, but if only a
//! wall clock is available, detect backward jumps and report the
//! correction so the timer heap can be shifted rather than firing every
//! pending timer at once.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Clock backing the reactor's timer heap.
pub struct Clock {
    monotonic: bool,
    start: Instant,
    epoch_wall: SystemTime,
    last_wall: Duration,
}

impl Clock {
    /// Probe for a monotonic clock source. `nix::time::clock_gettime`
    /// with `CLOCK_MONOTONIC` succeeding is treated as availability;
    /// std's `Instant` is itself backed by that source on every platform
    /// this crate targets, so detection and use are the same call.
    pub fn new() -> Self {
        let monotonic = Self::probe_monotonic();
        Self {
            monotonic,
            start: Instant::now(),
            epoch_wall: SystemTime::now(),
            last_wall: Self::wall_now(),
        }
    }

    #[cfg(unix)]
    fn probe_monotonic() -> bool {
        nix::time::clock_gettime(nix::time::ClockId::CLOCK_MONOTONIC).is_ok()
    }

    #[cfg(not(unix))]
    fn probe_monotonic() -> bool {
        true
    }

    fn wall_now() -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }

    /// Whether a monotonic clock source is in use.
    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }

    /// Current time, as an offset from this clock's construction.
    pub fn now(&self) -> Duration {
        if self.monotonic {
            self.start.elapsed()
        } else {
            Self::wall_now().saturating_sub(self.last_wall) + self.start.elapsed()
        }
    }

    /// Check for a backward wall-clock jump since the last call, and
    /// return the magnitude of the jump if one occurred. Under a
    /// monotonic clock this always returns `None`. The caller (the
    /// reactor's loop driver) passes a `Some` result to the timer heap's
    /// `correct` so every pending deadline is shifted forward by the
    /// same amount, preserving relative ordering instead of firing
    /// everything at once.
    pub fn check_jump(&mut self) -> Option<Duration> {
        if self.monotonic {
            return None;
        }
        let wall = Self::wall_now();
        let jump = if wall < self.last_wall {
            Some(self.last_wall - wall)
        } else {
            None
        };
        self.last_wall = wall;
        jump
    }

    /// Translate a deadline expressed in this clock's offset domain (as
    /// returned by [`Clock::now`], and stored as `Event::deadline`) into a
    /// wall-clock instant, for callers of `event-pending`'s `out-tv`.
    pub fn to_wall_clock(&self, offset: Duration) -> SystemTime {
        self.epoch_wall + offset
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_advances() {
        let clock = Clock::new();
        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(5));
        let t2 = clock.now();
        assert!(t2 > t1);
    }

    #[test]
    fn monotonic_clock_never_reports_jump() {
        let mut clock = Clock::new();
        if clock.is_monotonic() {
            assert_eq!(clock.check_jump(), None);
        }
    }
}
