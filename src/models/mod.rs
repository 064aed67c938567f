pub mod session;

pub use session::{EndReason, SessionOutcome};
