//! Rest countdown between sets.
//!
//! The timer only exposes state transitions. Whoever displays it owns the
//! one-second interval and calls [`RestTimer::tick`] once per elapsed second.

use serde::{Deserialize, Serialize};

/// Countdown state. Idle is `is_active == false` with `time_left == 0`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestTimer {
    pub time_left: u32,
    pub initial_time: u32,
    pub is_active: bool,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a countdown of `duration` seconds
    pub fn start(&mut self, duration: u32) {
        self.time_left = duration;
        self.initial_time = duration;
        self.is_active = duration > 0;
        tracing::debug!("Rest timer started for {}s", duration);
    }

    /// Advance one second. Returns true when this tick finished the countdown.
    pub fn tick(&mut self) -> bool {
        if !self.is_active {
            return false;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.is_active = false;
            tracing::debug!("Rest timer expired");
            return true;
        }
        false
    }

    /// Add `delta` seconds (negative to shorten), never below zero
    pub fn adjust(&mut self, delta: i64) {
        let adjusted = (i64::from(self.time_left) + delta).clamp(0, i64::from(u32::MAX));
        self.time_left = adjusted as u32;
    }

    /// Set the remaining time directly, leaving `is_active` alone
    pub fn set_time_left(&mut self, value: u32) {
        self.time_left = value;
    }

    /// Force the idle state; this is how rest gets skipped
    pub fn stop(&mut self) {
        self.is_active = false;
        self.time_left = 0;
    }

    /// Fraction of the countdown still remaining, 0.0 when idle
    pub fn progress(&self) -> f64 {
        if !self.is_active || self.initial_time == 0 {
            return 0.0;
        }
        (f64::from(self.time_left) / f64::from(self.initial_time)).min(1.0)
    }

    /// Remaining time as `m:ss`
    pub fn format(&self) -> String {
        format!("{}:{:02}", self.time_left / 60, self.time_left % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_sets_running() {
        let mut timer = RestTimer::new();
        timer.start(60);
        assert!(timer.is_active);
        assert_eq!(timer.time_left, 60);
        assert_eq!(timer.initial_time, 60);
    }

    #[test]
    fn test_expires_after_duration_ticks() {
        let mut timer = RestTimer::new();
        timer.start(5);
        let expired: Vec<bool> = (0..5).map(|_| timer.tick()).collect();
        assert_eq!(expired, vec![false, false, false, false, true]);
        assert!(!timer.is_active);
        assert_eq!(timer.time_left, 0);

        // Idle tick is a no-op
        assert!(!timer.tick());
        assert_eq!(timer, RestTimer { time_left: 0, initial_time: 5, is_active: false });
    }

    #[test]
    fn test_adjust_never_goes_negative() {
        let mut timer = RestTimer::new();
        timer.start(10);
        for delta in [-15, 30, -100, 5, -5, -1] {
            timer.adjust(delta);
        }
        assert_eq!(timer.time_left, 0);
        assert!(timer.is_active, "adjust does not change is_active");

        timer.adjust(15);
        assert_eq!(timer.time_left, 15);
    }

    #[test]
    fn test_stop_forces_idle() {
        let mut timer = RestTimer::new();
        timer.start(45);
        timer.tick();
        timer.stop();
        assert!(!timer.is_active);
        assert_eq!(timer.time_left, 0);

        // Stopping an idle timer is harmless
        timer.stop();
        assert!(!timer.is_active);
    }

    #[test]
    fn test_set_time_left_keeps_activity() {
        let mut timer = RestTimer::new();
        timer.start(60);
        timer.tick();
        timer.set_time_left(90);
        assert_eq!(timer.time_left, 90);
        assert!(timer.is_active);
    }

    #[test]
    fn test_progress_and_format() {
        let mut timer = RestTimer::new();
        assert_eq!(timer.progress(), 0.0);
        timer.start(90);
        for _ in 0..45 {
            timer.tick();
        }
        assert!((timer.progress() - 0.5).abs() < f64::EPSILON);
        assert_eq!(timer.format(), "0:45");
        timer.adjust(60);
        assert_eq!(timer.format(), "1:45");
    }
}
