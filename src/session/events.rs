use serde::Serialize;

use crate::{models::SessionOutcome, timer::TimerSnapshot, violations::ViolationKind};

/// Everything the presentation layer needs to re-render, in the order the
/// supervisor applied it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SessionEvent {
    TimerTick {
        timer: TimerSnapshot,
    },
    /// Sent once, the first time the countdown enters the warning window.
    TimeWarning {
        timer: TimerSnapshot,
    },
    ViolationRecorded {
        kind: ViolationKind,
        count: u32,
    },
    ViolationWarning {
        kind: ViolationKind,
        count: u32,
        message: String,
    },
    WarningAcknowledged,
    Paused {
        timer: TimerSnapshot,
    },
    Resumed {
        timer: TimerSnapshot,
    },
    /// New time limit on the clock, paused until the next resume.
    TimerReset {
        timer: TimerSnapshot,
    },
    Ended {
        outcome: SessionOutcome,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::TimerTick { .. } => "timer-tick",
            SessionEvent::TimeWarning { .. } => "time-warning",
            SessionEvent::ViolationRecorded { .. } => "violation-recorded",
            SessionEvent::ViolationWarning { .. } => "violation-warning",
            SessionEvent::WarningAcknowledged => "warning-acknowledged",
            SessionEvent::Paused { .. } => "timer-paused",
            SessionEvent::Resumed { .. } => "timer-resumed",
            SessionEvent::TimerReset { .. } => "timer-reset",
            SessionEvent::Ended { .. } => "session-ended",
        }
    }
}
