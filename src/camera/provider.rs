use async_trait::async_trait;
use thiserror::Error;

use super::{CameraConstraints, CameraState};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    NotFound,
    #[error("camera is in use by another application")]
    Busy,
    #[error("camera unavailable: {0}")]
    Other(String),
}

impl CameraError {
    /// Only a permission refusal maps to `Denied`; everything else is a device problem.
    pub fn classify(&self) -> CameraState {
        match self {
            CameraError::PermissionDenied => CameraState::Denied,
            CameraError::NotFound | CameraError::Busy | CameraError::Other(_) => CameraState::Error,
        }
    }
}

/// A live camera stream. Dropping a stream without calling `stop` leaves the
/// device engaged, so owners must stop it explicitly.
pub trait MediaStream: Send {
    fn id(&self) -> &str;
    fn stop(&mut self);
}

#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// May wait indefinitely on the user's permission decision. Dropping the
    /// returned future abandons the request.
    async fn request_stream(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}
