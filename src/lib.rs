pub mod camera;
pub mod models;
pub mod report;
pub mod session;
pub mod settings;
pub mod timer;
pub mod utils;
pub mod violations;

use std::sync::Arc;

use anyhow::{anyhow, Result};

use camera::{CameraClearance, CameraGate, CameraProvider};
use session::ProctorSession;
use settings::SettingsStore;

pub use utils::logging::init_logging;

/// What the host shell holds for the lifetime of the quiz page: the settings
/// and the camera gate the permission surface drives.
pub struct ProctorApp<P: CameraProvider> {
    settings: SettingsStore,
    camera: CameraGate<P>,
}

impl<P: CameraProvider> ProctorApp<P> {
    pub fn new(provider: Arc<P>, settings: SettingsStore) -> Result<Self> {
        let camera_constraints = settings.get()?.camera;
        Ok(Self {
            camera: CameraGate::new(provider, camera_constraints),
            settings,
        })
    }

    pub fn camera(&self) -> &CameraGate<P> {
        &self.camera
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Confirms the camera and starts the attempt. Fails if the camera is not granted.
    pub async fn begin(&self) -> Result<ProctorSession> {
        let clearance = self
            .camera
            .confirm_and_proceed()
            .await
            .ok_or_else(|| anyhow!("camera permission has not been granted"))?;
        self.start_session(clearance).await
    }

    pub async fn start_session(&self, clearance: CameraClearance) -> Result<ProctorSession> {
        let settings = self.settings.get()?;
        ProctorSession::start(clearance, &settings).await
    }
}
