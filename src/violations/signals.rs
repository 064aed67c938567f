//! Maps raw browser/window signals onto violation kinds.

use serde::{Deserialize, Serialize};

use super::ViolationKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyCombo {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyCombo {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    fn is_screenshot(&self) -> bool {
        let key = self.key.to_ascii_lowercase();
        if key == "printscreen" {
            return true;
        }
        // macOS Cmd+Shift+3/4/5, Windows Win+Shift+S
        self.meta && self.shift && matches!(key.as_str(), "3" | "4" | "5" | "s")
    }

    fn is_clipboard(&self) -> bool {
        self.command() && !self.shift && matches!(self.key.to_ascii_lowercase().as_str(), "c" | "x" | "v")
    }

    fn is_blocked_shortcut(&self) -> bool {
        let key = self.key.to_ascii_lowercase();
        if key == "f12" {
            return true;
        }
        if !self.command() {
            return false;
        }
        if self.shift {
            // devtools: Ctrl/Cmd+Shift+I/J/C
            return matches!(key.as_str(), "i" | "j" | "c");
        }
        matches!(key.as_str(), "a" | "p" | "s" | "u")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum RawSignal {
    VisibilityHidden,
    WindowBlur,
    Copy,
    Cut,
    Paste,
    ContextMenu,
    PrintScreen,
    KeyDown(KeyCombo),
}

impl RawSignal {
    /// `None` means the signal is allowed and should not be recorded.
    pub fn classify(&self) -> Option<ViolationKind> {
        match self {
            RawSignal::VisibilityHidden | RawSignal::WindowBlur => Some(ViolationKind::TabChange),
            RawSignal::Copy | RawSignal::Cut | RawSignal::Paste => Some(ViolationKind::CopyAttempt),
            RawSignal::ContextMenu => Some(ViolationKind::RightClick),
            RawSignal::PrintScreen => Some(ViolationKind::ScreenshotAttempt),
            RawSignal::KeyDown(combo) => {
                if combo.is_screenshot() {
                    Some(ViolationKind::ScreenshotAttempt)
                } else if combo.is_clipboard() {
                    Some(ViolationKind::CopyAttempt)
                } else if combo.is_blocked_shortcut() {
                    Some(ViolationKind::KeyboardShortcut)
                } else {
                    None
                }
            }
        }
    }
}
