pub mod kind;
pub mod policy;
pub mod signals;
pub mod tracker;

pub use kind::{message_for, ViolationEvent, ViolationKind};
pub use policy::{Decision, EscalationPolicy};
pub use signals::{KeyCombo, RawSignal};
pub use tracker::{Recorded, ViolationSession, ViolationStatus, ViolationTracker, Warning};
