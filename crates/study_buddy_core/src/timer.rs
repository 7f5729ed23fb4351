//! crates/study_buddy_core/src/timer.rs
//!
//! The countdown state machine that owns a study session's lifecycle.
//! It performs no I/O and holds no clock; callers pass instants in and act
//! on the transitions it reports.
//!
//! ```text
//!        start (remaining > 0)        remaining hits 0 / stop
//!  Idle ───────────────────────► Running ─────────────────────► Completed
//!   ▲                                                              │
//!   └──────────────────────────── reset ───────────────────────────┘
//! ```

use std::time::Instant;

pub const DEFAULT_MINUTES: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Completed,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Completed => "completed",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer can only be configured while idle")]
    NotIdle,
}

/// Result of a one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running with this many seconds left.
    Remaining(u32),
    /// The countdown reached zero; the caller must finish the session.
    Expired,
    /// The timer was not running.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    minutes: u32,
    seconds: u32,
    remaining: u32,
    phase: TimerPhase,
    started: Option<Instant>,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES, 0)
    }
}

impl CountdownTimer {
    pub fn new(minutes: u32, seconds: u32) -> Self {
        Self {
            minutes,
            seconds,
            remaining: configured_total(minutes, seconds),
            phase: TimerPhase::Idle,
            started: None,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    pub fn configured(&self) -> (u32, u32) {
        (self.minutes, self.seconds)
    }

    pub fn configured_seconds(&self) -> u32 {
        configured_total(self.minutes, self.seconds)
    }

    /// Changes the duration and recomputes the remaining time immediately.
    pub fn configure(&mut self, minutes: u32, seconds: u32) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Idle {
            return Err(TimerError::NotIdle);
        }
        self.minutes = minutes;
        self.seconds = seconds;
        self.remaining = configured_total(minutes, seconds);
        Ok(())
    }

    pub fn can_start(&self) -> bool {
        self.phase == TimerPhase::Idle && self.remaining > 0
    }

    /// Returns `false` without changing anything when starting is not allowed.
    pub fn start(&mut self, now: Instant) -> bool {
        if !self.can_start() {
            return false;
        }
        self.phase = TimerPhase::Running;
        self.started = Some(now);
        true
    }

    pub fn tick(&mut self) -> Tick {
        if self.phase != TimerPhase::Running {
            return Tick::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining)
        }
    }

    /// Moves a running timer to `Completed` and returns the elapsed wall time
    /// rounded to the nearest second.
    pub fn finish(&mut self, now: Instant) -> Option<i64> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let started = self.started.take()?;
        self.phase = TimerPhase::Completed;
        let elapsed = now.saturating_duration_since(started);
        Some(elapsed.as_secs_f64().round() as i64)
    }

    /// Back to `Idle` with the full configured duration.
    pub fn reset(&mut self) {
        self.phase = TimerPhase::Idle;
        self.started = None;
        self.remaining = configured_total(self.minutes, self.seconds);
    }
}

fn configured_total(minutes: u32, seconds: u32) -> u32 {
    minutes.saturating_mul(60).saturating_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_is_twenty_five_minutes() {
        let timer = CountdownTimer::default();
        assert_eq!(timer.remaining_seconds(), 25 * 60);
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn zero_duration_cannot_start() {
        let mut timer = CountdownTimer::new(0, 0);
        assert!(!timer.start(Instant::now()));
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(1, 0);
        assert!(timer.start(t0));
        assert!(!timer.start(t0 + Duration::from_secs(5)));
        assert_eq!(timer.finish(t0 + Duration::from_secs(10)), Some(10));
    }

    #[test]
    fn ticks_count_down_to_expiry() {
        let mut timer = CountdownTimer::new(0, 3);
        timer.start(Instant::now());
        assert_eq!(timer.tick(), Tick::Remaining(2));
        assert_eq!(timer.tick(), Tick::Remaining(1));
        assert_eq!(timer.tick(), Tick::Expired);
        assert_eq!(timer.remaining_seconds(), 0);
    }

    #[test]
    fn ticks_are_ignored_unless_running() {
        let mut timer = CountdownTimer::new(0, 3);
        assert_eq!(timer.tick(), Tick::Ignored);
        assert_eq!(timer.remaining_seconds(), 3);
    }

    #[test]
    fn finish_rounds_to_nearest_second() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(5, 0);
        timer.start(t0);
        assert_eq!(timer.finish(t0 + Duration::from_millis(2_600)), Some(3));
        assert_eq!(timer.phase(), TimerPhase::Completed);
        assert_eq!(timer.finish(t0 + Duration::from_secs(9)), None);
    }

    #[test]
    fn completed_timer_does_not_restart_without_reset() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(0, 1);
        timer.start(t0);
        assert_eq!(timer.tick(), Tick::Expired);
        timer.finish(t0 + Duration::from_secs(1));
        assert!(!timer.start(t0 + Duration::from_secs(2)));
        assert_eq!(timer.phase(), TimerPhase::Completed);
    }

    #[test]
    fn reset_restores_configured_duration() {
        let t0 = Instant::now();
        let mut timer = CountdownTimer::new(2, 30);
        timer.start(t0);
        for _ in 0..40 {
            timer.tick();
        }
        timer.finish(t0 + Duration::from_secs(40));
        timer.reset();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.remaining_seconds(), 150);
    }

    #[test]
    fn configuration_is_locked_outside_idle() {
        let mut timer = CountdownTimer::new(1, 0);
        timer.configure(0, 45).unwrap();
        assert_eq!(timer.remaining_seconds(), 45);

        timer.start(Instant::now());
        assert_eq!(timer.configure(10, 0), Err(TimerError::NotIdle));
        assert_eq!(timer.configured(), (0, 45));
    }
}
