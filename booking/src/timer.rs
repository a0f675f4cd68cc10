//! Reservation countdown.
//!
//! A pure value advanced by tick events. The flow reducer schedules one
//! delayed tick per second through the runtime and feeds each tick back in, so
//! tests can drive the countdown without a wall clock.

use serde::{Deserialize, Serialize};

/// Result of feeding one tick into the timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting down
    Running {
        /// Seconds left after this tick
        remaining_seconds: u32,
    },
    /// This tick brought the countdown to zero; reported once per start
    Expired,
    /// Tick from a stopped timer or an earlier start; nothing changed
    Ignored,
}

/// How close the countdown is to running out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Urgency {
    /// More than half the time left
    Relaxed,
    /// Between a quarter and a half left
    Warning,
    /// A quarter or less left
    Critical,
}

/// Countdown bounding how long seats may be held before booking
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationTimer {
    total_seconds: u32,
    remaining_seconds: u32,
    generation: u64,
    running: bool,
}

impl ReservationTimer {
    /// An idle timer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the countdown
    ///
    /// Returns the generation that ticks must carry. Ticks of earlier starts
    /// are ignored.
    pub fn start(&mut self, duration_minutes: u32) -> u64 {
        self.generation += 1;
        self.total_seconds = duration_minutes.saturating_mul(60);
        self.remaining_seconds = self.total_seconds;
        self.running = true;
        self.generation
    }

    /// Stop the countdown; it will not expire afterwards
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one second
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if !self.running || generation != self.generation {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }

    /// Whether the countdown is active
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Generation of the latest start
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Seconds left
    #[must_use]
    pub const fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Length of the latest start in seconds
    #[must_use]
    pub const fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// Remaining time as `MM:SS`
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_seconds / 60, self.remaining_seconds % 60)
    }

    /// Urgency band for the remaining share of time
    #[must_use]
    pub const fn urgency(&self) -> Urgency {
        let remaining = self.remaining_seconds as u64 * 4;
        let total = self.total_seconds as u64;
        if remaining > total * 2 {
            Urgency::Relaxed
        } else if remaining > total {
            Urgency::Warning
        } else {
            Urgency::Critical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_exactly_once_after_full_duration() {
        let mut timer = ReservationTimer::new();
        let generation = timer.start(15);
        assert_eq!(timer.display(), "15:00");

        let mut expirations = 0;
        for tick in 1..=900 {
            match timer.tick(generation) {
                TickOutcome::Expired => {
                    expirations += 1;
                    assert_eq!(tick, 900);
                },
                TickOutcome::Running { remaining_seconds } => assert_eq!(remaining_seconds, 900 - tick),
                TickOutcome::Ignored => unreachable!("running timer ignored tick {tick}"),
            }
        }
        assert_eq!(expirations, 1);
        assert_eq!(timer.tick(generation), TickOutcome::Ignored);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stop_prevents_expiry() {
        let mut timer = ReservationTimer::new();
        let generation = timer.start(1);
        for _ in 0..30 {
            timer.tick(generation);
        }
        timer.stop();
        for _ in 0..60 {
            assert_eq!(timer.tick(generation), TickOutcome::Ignored);
        }
        assert_eq!(timer.remaining_seconds(), 30);
    }

    #[test]
    fn test_restart_ignores_stale_ticks() {
        let mut timer = ReservationTimer::new();
        let first = timer.start(1);
        let second = timer.start(1);
        assert_ne!(first, second);
        assert_eq!(timer.tick(first), TickOutcome::Ignored);
        assert_eq!(timer.tick(second), TickOutcome::Running { remaining_seconds: 59 });
    }

    #[test]
    fn test_urgency_bands() {
        let mut timer = ReservationTimer::new();
        let generation = timer.start(1);
        assert_eq!(timer.urgency(), Urgency::Relaxed);
        for _ in 0..30 {
            timer.tick(generation);
        }
        assert_eq!(timer.urgency(), Urgency::Warning);
        for _ in 0..15 {
            timer.tick(generation);
        }
        assert_eq!(timer.urgency(), Urgency::Critical);
        assert_eq!(timer.display(), "00:15");
    }
}
