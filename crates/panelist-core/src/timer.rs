//! Interview countdown timer.
//!
//! Time is driven from outside through [`InterviewTimer::tick`], which keeps
//! the timer deterministic in tests; the CLI ticks it once per second.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Remaining time at or below which a running timer is in `Warning`.
pub const WARNING_THRESHOLD: Duration = Duration::from_secs(60);

const DEFAULT_DURATION: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Not started, or reset.
    Idle,
    Running,
    Paused,
    /// Running with a minute or less left.
    Warning,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewTimer {
    duration: Duration,
    /// `None` until first started.
    remaining: Option<Duration>,
    running: bool,
}

impl Default for InterviewTimer {
    /// Ten minutes.
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl InterviewTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: None,
            running: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time left; the full duration while idle.
    pub fn remaining(&self) -> Duration {
        self.remaining.unwrap_or(self.duration)
    }

    pub fn phase(&self) -> TimerPhase {
        match self.remaining {
            None => TimerPhase::Idle,
            Some(left) if left.is_zero() => TimerPhase::Done,
            Some(left) if self.running && left <= WARNING_THRESHOLD => TimerPhase::Warning,
            Some(_) if self.running => TimerPhase::Running,
            Some(_) => TimerPhase::Paused,
        }
    }

    /// Start from idle, or resume after a pause. No effect once done.
    pub fn start(&mut self) -> TimerPhase {
        let left = *self.remaining.get_or_insert(self.duration);
        self.running = !left.is_zero();
        self.phase()
    }

    pub fn pause(&mut self) -> TimerPhase {
        self.running = false;
        self.phase()
    }

    /// Back to idle with the full duration.
    pub fn reset(&mut self) -> TimerPhase {
        self.running = false;
        self.remaining = None;
        self.phase()
    }

    /// Advance a running timer by `elapsed`. Stops at zero.
    pub fn tick(&mut self, elapsed: Duration) -> TimerPhase {
        if self.running {
            if let Some(left) = self.remaining.as_mut() {
                *left = left.saturating_sub(elapsed);
                if left.is_zero() {
                    self.running = false;
                }
            }
        }
        self.phase()
    }

    /// Remaining time as `MM:SS`, rounding partial seconds up.
    pub fn display(&self) -> String {
        let left = self.remaining();
        let mut secs = left.as_secs();
        if left.subsec_nanos() > 0 {
            secs += 1;
        }
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
