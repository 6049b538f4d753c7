use super::feed::FeedHandle;
use crate::error::AcquireError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    User,
    /// Rear camera, facing the scene
    #[default]
    Environment,
}

/// What the capture session asks the platform for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureConstraints {
    /// Preferred camera
    pub facing: FacingMode,
    /// Whether a microphone track is wanted
    pub audio: bool,
}

impl CaptureConstraints {
    /// Rear camera, video only
    pub fn rear_camera() -> Self {
        Self {
            facing: FacingMode::Environment,
            audio: false,
        }
    }
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self::rear_camera()
    }
}

/// Permission-mediated access to camera feeds
///
/// `acquire` suspends until the platform grants or denies access. A granted
/// feed is owned by the caller, who must stop its tracks when done.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Request a feed matching `constraints`
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<FeedHandle, AcquireError>;
}
