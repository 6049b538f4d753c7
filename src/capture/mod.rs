//! Camera acquisition and the capture session lifecycle

/// Camera provider seam and capture constraints
pub mod camera;
/// Feed handles, tracks and the frame slot backends publish into
pub mod feed;
/// Capture session manager and lifecycle state machine
pub mod manager;
/// Real camera devices through nokhwa
#[cfg(feature = "camera")]
pub mod nokhwa_camera;

pub use camera::{CameraProvider, CaptureConstraints, FacingMode};
pub use feed::{
    FeedHandle, FrameSlotFeed, MediaFeed, TrackInfo, TrackKind, TrackState, VideoFrame,
    stop_all_tracks,
};
pub use manager::{CaptureSessionManager, StartOutcome};
#[cfg(feature = "camera")]
pub use nokhwa_camera::NokhwaCamera;
