//! Development helpers: a camera that replays still images
//!
//! [`ReplayCamera`] lets the scan loop run without capture hardware. Frames
//! are loaded once from a directory of images and pushed into the feed at a
//! fixed rate, looping until the session stops the feed's tracks.

use crate::capture::{CameraProvider, CaptureConstraints, FeedHandle, FrameSlotFeed, MediaFeed};
use crate::error::AcquireError;
use async_trait::async_trait;
use image::{GenericImageView, RgbaImage};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

fn max_dim_from_env() -> Option<u32> {
    match env::var("QR_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image as RGBA, shrinking it to `QR_MAX_DIM` on its longest side
/// when that variable is set
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage, image::ImageError> {
    let img = image::open(path)?;
    let img = match max_dim_from_env() {
        Some(max_dim) if img.dimensions().0.max(img.dimensions().1) > max_dim => {
            img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    Ok(img.to_rgba8())
}

/// Every image file below `root`, sorted by path
pub fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                    images.push(path);
                }
            }
        }
    }

    images.sort();
    images
}

/// Camera provider that loops over preloaded frames
///
/// Hands out one feed at a time: a second `acquire` while the previous feed
/// still has a live track fails with [`AcquireError::DeviceBusy`].
pub struct ReplayCamera {
    label: String,
    frames: Arc<Vec<RgbaImage>>,
    frame_interval: Duration,
    current: Mutex<Option<Weak<FrameSlotFeed>>>,
}

impl ReplayCamera {
    /// Replay `frames` at `fps` frames per second (at least one)
    pub fn from_frames(label: impl Into<String>, frames: Vec<RgbaImage>, fps: u32) -> Self {
        Self {
            label: label.into(),
            frames: Arc::new(frames),
            frame_interval: Duration::from_secs(1) / fps.max(1),
            current: Mutex::new(None),
        }
    }

    /// Replay every readable image below `root`
    ///
    /// Unreadable files are logged and skipped. An empty directory yields a
    /// camera whose `acquire` reports [`AcquireError::NoDeviceAvailable`].
    pub fn from_dir<P: AsRef<Path>>(root: P, fps: u32) -> Self {
        let root = root.as_ref();
        let mut frames = Vec::new();
        for path in collect_images(root) {
            match load_rgba(&path) {
                Ok(frame) => frames.push(frame),
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable image"),
            }
        }
        debug!(root = %root.display(), frames = frames.len(), fps, "replay camera loaded");
        Self::from_frames(format!("replay:{}", root.display()), frames, fps)
    }

    /// Number of frames in the loop
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Time between two pushed frames
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

#[async_trait]
impl CameraProvider for ReplayCamera {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<FeedHandle, AcquireError> {
        if self.frames.is_empty() {
            return Err(AcquireError::NoDeviceAvailable);
        }

        let feed = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            let busy = current
                .as_ref()
                .and_then(Weak::upgrade)
                .is_some_and(|feed| feed.is_active());
            if busy {
                return Err(AcquireError::DeviceBusy);
            }
            let feed = Arc::new(FrameSlotFeed::new(self.label.clone()));
            *current = Some(Arc::downgrade(&feed));
            feed
        };

        debug!(
            label = %self.label,
            facing = ?constraints.facing,
            frames = self.frames.len(),
            "replay feed opened"
        );
        tokio::spawn(replay(
            Arc::clone(&feed),
            Arc::clone(&self.frames),
            self.frame_interval,
        ));
        Ok(feed as FeedHandle)
    }
}

impl std::fmt::Debug for ReplayCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayCamera")
            .field("label", &self.label)
            .field("frames", &self.frames.len())
            .field("frame_interval", &self.frame_interval)
            .finish()
    }
}

async fn replay(feed: Arc<FrameSlotFeed>, frames: Arc<Vec<RgbaImage>>, interval: Duration) {
    let started = Instant::now();
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for frame in frames.iter().cycle() {
        ticker.tick().await;
        if !feed.push_frame_at(frame.clone(), started.elapsed()) {
            break;
        }
    }
    debug!(label = feed.label(), pushed = feed.frames_pushed(), "replay feed ended");
}
