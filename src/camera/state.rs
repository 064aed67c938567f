use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CameraState {
    #[default]
    Requesting,
    Granted,
    Denied,
    Error,
}

impl CameraState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraState::Requesting => "requesting",
            CameraState::Granted => "granted",
            CameraState::Denied => "denied",
            CameraState::Error => "error",
        }
    }

    /// Only `Granted` lets the student continue into the quiz.
    pub fn permits_progress(&self) -> bool {
        matches!(self, CameraState::Granted)
    }

    /// States the student can leave through an explicit retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CameraState::Denied | CameraState::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    User,
    Environment,
}

/// Capability profile passed to the acquisition provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            ideal_width: 640,
            ideal_height: 480,
            audio: false,
        }
    }
}
