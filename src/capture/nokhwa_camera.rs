//! Real camera devices through nokhwa
//!
//! nokhwa cameras are not `Send` on every backend, so each feed gets its own
//! capture thread that opens the device, reports the outcome back to
//! `acquire`, then pushes frames until the session stops the feed's tracks.

use super::camera::{CameraProvider, CaptureConstraints};
use super::feed::{FeedHandle, FrameSlotFeed, MediaFeed, stop_all_tracks};
use crate::error::AcquireError;
use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Consecutive read failures before the capture thread gives up
const MAX_READ_FAILURES: u32 = 30;

/// Camera provider for a local capture device
#[derive(Debug, Clone, Copy)]
pub struct NokhwaCamera {
    index: u32,
}

impl NokhwaCamera {
    /// Device at `index` in the platform's enumeration order
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

impl Default for NokhwaCamera {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl CameraProvider for NokhwaCamera {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<FeedHandle, AcquireError> {
        // Device enumeration carries no facing information
        debug!(index = self.index, facing = ?constraints.facing, "opening capture device");

        let feed = Arc::new(FrameSlotFeed::new(format!("camera:{}", self.index)));
        let (opened_tx, opened_rx) = oneshot::channel();
        let index = self.index;
        let thread_feed = Arc::clone(&feed);
        thread::Builder::new()
            .name(format!("camera-{index}"))
            .spawn(move || capture_thread(index, thread_feed, opened_tx))
            .map_err(|err| AcquireError::Backend(err.to_string()))?;

        match opened_rx.await {
            Ok(Ok(())) => Ok(feed as FeedHandle),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(AcquireError::Backend(
                "capture thread exited before opening the device".to_string(),
            )),
        }
    }
}

fn capture_thread(
    index: u32,
    feed: Arc<FrameSlotFeed>,
    opened: oneshot::Sender<Result<(), AcquireError>>,
) {
    let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = match Camera::new(CameraIndex::Index(index), format) {
        Ok(camera) => camera,
        Err(err) => {
            let _ = opened.send(Err(classify(&err.to_string())));
            return;
        }
    };
    if let Err(err) = camera.open_stream() {
        let _ = opened.send(Err(classify(&err.to_string())));
        return;
    }
    if opened.send(Ok(())).is_err() {
        // acquire() was abandoned; nobody will ever stop this feed
        if let Err(err) = camera.stop_stream() {
            warn!(index, %err, "failed to stop abandoned camera stream");
        }
        return;
    }
    info!(index, format = ?camera.camera_format(), "capture device streaming");

    let mut failures = 0;
    while feed.is_active() {
        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        match decoded {
            Ok(rgb) => {
                failures = 0;
                let (width, height) = (rgb.width(), rgb.height());
                if let Some(image) = RgbImage::from_raw(width, height, rgb.into_raw()) {
                    feed.push_frame(DynamicImage::ImageRgb8(image).to_rgba8());
                }
            }
            Err(err) => {
                failures += 1;
                warn!(index, failures, %err, "failed to read camera frame");
                if failures >= MAX_READ_FAILURES {
                    stop_all_tracks(feed.as_ref());
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    }

    if let Err(err) = camera.stop_stream() {
        warn!(index, %err, "failed to stop camera stream");
    }
    debug!(index, frames = feed.frames_pushed(), "capture thread exiting");
}

fn classify(message: &str) -> AcquireError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        AcquireError::PermissionDenied
    } else if lower.contains("busy") || lower.contains("in use") {
        AcquireError::DeviceBusy
    } else if lower.contains("not found") || lower.contains("no device") || lower.contains("out of range") {
        AcquireError::NoDeviceAvailable
    } else {
        AcquireError::Backend(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_backend_messages() {
        assert_eq!(classify("Permission denied (os error 13)"), AcquireError::PermissionDenied);
        assert_eq!(classify("Device or resource busy"), AcquireError::DeviceBusy);
        assert_eq!(classify("camera index 3 not found"), AcquireError::NoDeviceAvailable);
        assert_eq!(
            classify("unsupported fourcc"),
            AcquireError::Backend("unsupported fourcc".to_string())
        );
    }
}
