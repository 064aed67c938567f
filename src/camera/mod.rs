pub mod gate;
pub mod provider;
pub mod state;

pub use gate::{CameraClearance, CameraGate};
pub use provider::{CameraError, CameraProvider, MediaStream};
pub use state::{CameraConstraints, CameraState, FacingMode};
