//! Error types for capture acquisition, sampling and configuration

use thiserror::Error;

/// Why the platform refused to hand over a camera feed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// The user or platform policy denied camera access
    #[error("camera permission denied")]
    PermissionDenied,
    /// No camera matching the requested constraints exists
    #[error("no camera device available")]
    NoDeviceAvailable,
    /// The camera exists but another client holds it
    #[error("camera device is busy")]
    DeviceBusy,
    /// Any other backend failure, with the backend's own message
    #[error("camera backend error: {0}")]
    Backend(String),
}

/// Errors reported by [`crate::CaptureSessionManager::start`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Feed acquisition failed; the manager is back in `Idle`
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(#[from] AcquireError),
}

/// Why a scan tick could not sample a frame
///
/// Never surfaced to callers: the tick is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SampleError {
    /// The video surface has no frame yet or the bitmap surface has no area
    #[error("video or bitmap surface unavailable")]
    SurfaceUnavailable,
}

/// Rejected scan configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A zero scan period would spin the loop
    #[error("scan period must be greater than zero")]
    ZeroPeriod,
    /// The sampling bitmap needs a positive area
    #[error("sample size {width}x{height} must be non-zero in both dimensions")]
    EmptySampleSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}
