use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ViolationEvent, ViolationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ViolationStatus {
    #[default]
    Active,
    /// A warning is on screen and has not been acknowledged.
    Warned,
    Terminated,
}

impl ViolationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationStatus::Active => "active",
            ViolationStatus::Warned => "warned",
            ViolationStatus::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViolationSession {
    pub count: u32,
    pub log: Vec<ViolationEvent>,
    pub status: ViolationStatus,
}

impl ViolationSession {
    pub fn last_kind(&self) -> Option<ViolationKind> {
        self.log.last().map(|event| event.kind)
    }

    pub fn count_of(&self, kind: ViolationKind) -> u32 {
        self.log.iter().filter(|event| event.kind == kind).count() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub kind: ViolationKind,
    pub count: u32,
}

impl Warning {
    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub event: ViolationEvent,
    pub count: u32,
    /// Set only when this violation moved the session from active to warned.
    pub warning: Option<Warning>,
}

/// Reducer over the ordered violation stream. Callers serialize access.
#[derive(Debug, Clone, Default)]
pub struct ViolationTracker {
    session: ViolationSession,
}

impl ViolationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &ViolationSession {
        &self.session
    }

    pub fn status(&self) -> ViolationStatus {
        self.session.status
    }

    pub fn count(&self) -> u32 {
        self.session.count
    }

    pub fn record(&mut self, kind: ViolationKind) -> Option<Recorded> {
        self.record_at(kind, Utc::now())
    }

    /// Returns `None` once terminated: the log is frozen at that point.
    pub fn record_at(&mut self, kind: ViolationKind, timestamp: DateTime<Utc>) -> Option<Recorded> {
        if self.session.status == ViolationStatus::Terminated {
            return None;
        }

        let event = ViolationEvent { kind, timestamp };
        self.session.log.push(event.clone());
        self.session.count = self.session.log.len() as u32;

        let warning = match self.session.status {
            ViolationStatus::Active => {
                self.session.status = ViolationStatus::Warned;
                Some(Warning {
                    kind,
                    count: self.session.count,
                })
            }
            ViolationStatus::Warned | ViolationStatus::Terminated => None,
        };

        Some(Recorded {
            event,
            count: self.session.count,
            warning,
        })
    }

    /// Returns true if an outstanding warning was cleared.
    pub fn acknowledge(&mut self) -> bool {
        if self.session.status != ViolationStatus::Warned {
            return false;
        }
        self.session.status = ViolationStatus::Active;
        true
    }

    /// Returns true on the first call only.
    pub fn terminate(&mut self) -> bool {
        if self.session.status == ViolationStatus::Terminated {
            return false;
        }
        self.session.status = ViolationStatus::Terminated;
        true
    }
}
