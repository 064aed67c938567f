use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::EndReason,
    violations::{ViolationEvent, ViolationKind, ViolationSession, ViolationStatus},
};

/// Read-only view of a session's violations for instructor review. The core
/// never sends this anywhere; the host hands it to its reporting backend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViolationReport {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_reason: Option<EndReason>,
    pub status: ViolationStatus,
    pub count: u32,
    pub by_kind: BTreeMap<ViolationKind, u32>,
    pub log: Vec<ViolationEvent>,
}

impl ViolationReport {
    pub fn new(
        session_id: &str,
        started_at: DateTime<Utc>,
        violations: &ViolationSession,
        ended: Option<(DateTime<Utc>, EndReason)>,
    ) -> Self {
        let mut by_kind = BTreeMap::new();
        for event in &violations.log {
            *by_kind.entry(event.kind).or_insert(0) += 1;
        }

        Self {
            session_id: session_id.to_string(),
            started_at,
            ended_at: ended.map(|(at, _)| at),
            end_reason: ended.map(|(_, reason)| reason),
            status: violations.status,
            count: violations.count,
            by_kind,
            log: violations.log.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize violation report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violations::ViolationTracker;

    #[test]
    fn tallies_by_kind() {
        let mut tracker = ViolationTracker::new();
        tracker.record(ViolationKind::TabChange);
        tracker.record(ViolationKind::TabChange);
        tracker.record(ViolationKind::CopyAttempt);

        let report = ViolationReport::new("s-1", Utc::now(), tracker.session(), None);
        assert_eq!(report.count, 3);
        assert_eq!(report.by_kind.get(&ViolationKind::TabChange), Some(&2));
        assert_eq!(report.by_kind.get(&ViolationKind::CopyAttempt), Some(&1));
        assert_eq!(report.by_kind.get(&ViolationKind::RightClick), None);
        assert_eq!(report.log.len(), 3);
        assert_eq!(report.end_reason, None);
    }

    #[test]
    fn serializes_with_wire_names() {
        let mut tracker = ViolationTracker::new();
        tracker.record(ViolationKind::ScreenshotAttempt);
        tracker.terminate();

        let report = ViolationReport::new(
            "s-2",
            Utc::now(),
            tracker.session(),
            Some((Utc::now(), EndReason::StudentExit)),
        );
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["sessionId"], "s-2");
        assert_eq!(value["status"], "terminated");
        assert_eq!(value["byKind"]["screenshot_attempt"], 1);
        assert_eq!(value["endReason"]["reason"], "studentExit");
        assert_eq!(value["log"][0]["kind"], "screenshot_attempt");
    }
}
