//! Camera feed handles and their tracks
//!
//! A feed is what a [`super::CameraProvider`] hands back: one or more tracks
//! plus a slot holding the most recent video frame. Backends push frames into
//! the slot from their own capture thread; the video surface reads it.

use image::RgbaImage;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared handle to a live feed
pub type FeedHandle = Arc<dyn MediaFeed>;

/// Media kind carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Camera frames
    Video,
    /// Microphone samples. Never requested by this crate
    Audio,
}

/// Whether a track still holds its device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackState {
    /// Device held, data flowing
    Live,
    /// Stopped; the device has been released
    Ended,
}

/// Snapshot of one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Backend-assigned track id
    pub id: String,
    /// Media kind
    pub kind: TrackKind,
    /// Current state
    pub state: TrackState,
}

/// One decoded camera frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGBA pixels at the camera's native resolution
    pub image: RgbaImage,
    /// Presentation time relative to the start of the feed
    pub timestamp: Duration,
}

/// A camera feed as seen by the capture session
pub trait MediaFeed: Send + Sync + fmt::Debug {
    /// Human-readable device label
    fn label(&self) -> &str;

    /// Snapshot of every track in the feed
    fn tracks(&self) -> Vec<TrackInfo>;

    /// Stop one track and release its device. Stopping an ended track is a no-op
    fn stop_track(&self, id: &str);

    /// Most recent frame, if the camera has produced one
    fn latest_frame(&self) -> Option<Arc<VideoFrame>>;

    /// True while at least one video track is live
    fn is_active(&self) -> bool {
        self.tracks()
            .iter()
            .any(|t| t.kind == TrackKind::Video && t.state == TrackState::Live)
    }
}

/// Stop every live track of `feed`, returning how many were stopped
pub fn stop_all_tracks(feed: &dyn MediaFeed) -> usize {
    let mut stopped = 0;
    for track in feed.tracks() {
        if track.state == TrackState::Live {
            feed.stop_track(&track.id);
            stopped += 1;
        }
    }
    debug!(feed = feed.label(), stopped, "stopped feed tracks");
    stopped
}

/// Feed backed by a single-frame slot
///
/// Capture backends own a thread or task that calls [`FrameSlotFeed::push_frame`]
/// until [`MediaFeed::is_active`] turns false.
pub struct FrameSlotFeed {
    label: String,
    started: Instant,
    tracks: Mutex<Vec<TrackInfo>>,
    latest: Mutex<Option<Arc<VideoFrame>>>,
    frames_pushed: AtomicU64,
}

impl FrameSlotFeed {
    /// Feed with a single live video track
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let track = TrackInfo {
            id: format!("{label}/video-0"),
            kind: TrackKind::Video,
            state: TrackState::Live,
        };
        Self {
            label,
            started: Instant::now(),
            tracks: Mutex::new(vec![track]),
            latest: Mutex::new(None),
            frames_pushed: AtomicU64::new(0),
        }
    }

    /// Publish a frame stamped with the time since the feed was created
    ///
    /// Returns false once every video track has ended; the producer should stop.
    pub fn push_frame(&self, image: RgbaImage) -> bool {
        let timestamp = self.started.elapsed();
        self.push_frame_at(image, timestamp)
    }

    /// Publish a frame with an explicit presentation time
    pub fn push_frame_at(&self, image: RgbaImage, timestamp: Duration) -> bool {
        if !self.is_active() {
            return false;
        }
        let frame = Arc::new(VideoFrame { image, timestamp });
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
        self.frames_pushed.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of frames published so far
    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed.load(Ordering::Relaxed)
    }
}

impl MediaFeed for FrameSlotFeed {
    fn label(&self) -> &str {
        &self.label
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn stop_track(&self, id: &str) {
        let mut tracks = self.tracks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(track) = tracks.iter_mut().find(|t| t.id == id) {
            track.state = TrackState::Ended;
        }
        if tracks.iter().all(|t| t.state == TrackState::Ended) {
            // Drop the last frame so nothing keeps showing a released camera
            *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    fn latest_frame(&self) -> Option<Arc<VideoFrame>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for FrameSlotFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSlotFeed")
            .field("label", &self.label)
            .field("frames_pushed", &self.frames_pushed())
            .field("active", &self.is_active())
            .finish()
    }
}
