use serde::{Deserialize, Serialize};

use super::{Recorded, ViolationKind, Warning};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EscalationPolicy {
    /// Force the session closed once this many violations are on record.
    pub max_violations: Option<u32>,
    /// Kinds that end the session on first occurrence.
    pub zero_tolerance: Vec<ViolationKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "decision")]
pub enum Decision {
    Warn(Warning),
    Continue,
    ForceExit { kind: ViolationKind, count: u32 },
}

impl EscalationPolicy {
    pub fn evaluate(&self, recorded: &Recorded) -> Decision {
        let kind = recorded.event.kind;
        let over_limit = self
            .max_violations
            .map(|limit| recorded.count >= limit)
            .unwrap_or(false);

        if self.zero_tolerance.contains(&kind) || over_limit {
            return Decision::ForceExit {
                kind,
                count: recorded.count,
            };
        }

        match recorded.warning {
            Some(warning) => Decision::Warn(warning),
            None => Decision::Continue,
        }
    }
}
