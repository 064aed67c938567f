pub mod controller;
pub mod state;

pub use controller::{TimerController, TimerEvent, TimerSnapshot};
pub use state::{format_for_display, TickOutcome, TimerState, WARNING_THRESHOLD_SECS};
