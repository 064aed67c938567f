use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::violations::ViolationKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum EndReason {
    /// The countdown reached zero and the attempt was auto-submitted.
    TimeExpired,
    /// The escalation policy forced the student out.
    PolicyTerminated { kind: ViolationKind, count: u32 },
    /// The student chose to leave from the warning prompt.
    StudentExit,
    Submitted,
    /// Every handle to the session was dropped.
    Abandoned,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::TimeExpired => "timeExpired",
            EndReason::PolicyTerminated { .. } => "policyTerminated",
            EndReason::StudentExit => "studentExit",
            EndReason::Submitted => "submitted",
            EndReason::Abandoned => "abandoned",
        }
    }

    /// Whether the answers given so far should be submitted for grading.
    pub fn submits_answers(&self) -> bool {
        matches!(self, EndReason::TimeExpired | EndReason::Submitted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: String,
    pub reason: EndReason,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub remaining_seconds: u64,
    pub violation_count: u32,
}
