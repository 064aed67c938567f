use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const GENERIC_MESSAGE: &str = "A security violation was detected. Your activity has been recorded.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TabChange,
    CopyAttempt,
    RightClick,
    ScreenshotAttempt,
    KeyboardShortcut,
    #[serde(other)]
    Other,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 6] = [
        ViolationKind::TabChange,
        ViolationKind::CopyAttempt,
        ViolationKind::RightClick,
        ViolationKind::ScreenshotAttempt,
        ViolationKind::KeyboardShortcut,
        ViolationKind::Other,
    ];

    /// Unknown names map to `Other`; parsing never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "tab_change" => ViolationKind::TabChange,
            "copy_attempt" => ViolationKind::CopyAttempt,
            "right_click" => ViolationKind::RightClick,
            "screenshot_attempt" => ViolationKind::ScreenshotAttempt,
            "keyboard_shortcut" => ViolationKind::KeyboardShortcut,
            _ => ViolationKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TabChange => "tab_change",
            ViolationKind::CopyAttempt => "copy_attempt",
            ViolationKind::RightClick => "right_click",
            ViolationKind::ScreenshotAttempt => "screenshot_attempt",
            ViolationKind::KeyboardShortcut => "keyboard_shortcut",
            ViolationKind::Other => "other",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ViolationKind::TabChange => {
                "You switched tabs or left the quiz window. Stay on this page until you submit."
            }
            ViolationKind::CopyAttempt => "Copying or pasting content is not allowed during the quiz.",
            ViolationKind::RightClick => "Right-click is disabled during the quiz.",
            ViolationKind::ScreenshotAttempt => "Taking screenshots is not allowed during the quiz.",
            ViolationKind::KeyboardShortcut => "Keyboard shortcuts are disabled during the quiz.",
            ViolationKind::Other => GENERIC_MESSAGE,
        }
    }
}

impl From<&str> for ViolationKind {
    fn from(raw: &str) -> Self {
        ViolationKind::parse(raw)
    }
}

/// Message lookup for kinds that arrive as raw strings from the host.
pub fn message_for(raw: &str) -> &'static str {
    ViolationKind::parse(raw).message()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationEvent {
    pub kind: ViolationKind,
    pub timestamp: DateTime<Utc>,
}
