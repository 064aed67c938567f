pub mod controller;
pub mod events;

pub use controller::{ProctorSession, RecordReply, SessionSnapshot};
pub use events::SessionEvent;
