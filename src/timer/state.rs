use serde::{Deserialize, Serialize};

/// Remaining time at or below which the countdown is shown as a warning.
pub const WARNING_THRESHOLD_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second elapsed, time still remains.
    Ticked,
    /// This tick brought the countdown to zero. Returned once per run cycle.
    Expired,
    /// The timer was paused or already expired; nothing changed.
    Ignored,
}

/// The default state is idle: nothing on the clock, not running and not
/// expired. Only `start` or `reset` put time on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub time_limit_minutes: u32,
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub is_expired: bool,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, time_limit_minutes: u32) {
        *self = Self {
            time_limit_minutes,
            remaining_seconds: u64::from(time_limit_minutes) * 60,
            is_running: true,
            is_expired: false,
        };
    }

    /// Same as `start` but leaves the countdown paused.
    pub fn reset(&mut self, time_limit_minutes: u32) {
        self.start(time_limit_minutes);
        self.is_running = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running || self.is_expired || self.remaining_seconds == 0 {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.is_expired = true;
            self.is_running = false;
            return TickOutcome::Expired;
        }

        TickOutcome::Ticked
    }

    /// Returns true if the state changed.
    pub fn pause(&mut self) -> bool {
        if !self.is_running || self.is_expired {
            return false;
        }
        self.is_running = false;
        true
    }

    /// Returns true if the state changed.
    /// Ignored when there is no time on the clock, including before `start`.
    pub fn resume(&mut self) -> bool {
        if self.is_running || self.is_expired || self.remaining_seconds == 0 {
            return false;
        }
        self.is_running = true;
        true
    }

    /// Stops the countdown in place without expiring it. Used when the session
    /// ends through some other path.
    pub fn halt(&mut self) {
        self.is_running = false;
    }

    pub fn is_warning_threshold(&self) -> bool {
        !self.is_expired && self.remaining_seconds > 0 && self.remaining_seconds <= WARNING_THRESHOLD_SECS
    }

    pub fn display(&self) -> String {
        format_for_display(self.remaining_seconds)
    }
}

/// Formats seconds as `MM:SS`. Minutes grow past two digits when needed.
pub fn format_for_display(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
