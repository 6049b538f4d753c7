//! Video surface seam and the preview that plays an attached feed

use crate::capture::{FeedHandle, VideoFrame};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How much media the surface has buffered, in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    /// Nothing attached or nothing received
    HaveNothing = 0,
    /// Feed attached, dimensions known, no frame yet
    HaveMetadata = 1,
    /// Current frame available, nothing beyond it
    HaveCurrentData = 2,
    /// Current frame available and more are arriving
    HaveFutureData = 3,
    /// Enough data to play through
    HaveEnoughData = 4,
}

/// Playback status reported by a video surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Presentation position
    pub current_time: Duration,
    /// Playback paused
    pub paused: bool,
    /// Feed ended
    pub ended: bool,
    /// Buffering level
    pub ready_state: ReadyState,
}

impl PlaybackState {
    /// State of a surface with no feed attached
    pub const DETACHED: PlaybackState = PlaybackState {
        current_time: Duration::ZERO,
        paused: true,
        ended: false,
        ready_state: ReadyState::HaveNothing,
    };

    /// True when frames are actually being rendered: position advanced, not
    /// paused or ended, and more than the current frame buffered
    pub fn is_live_playing(&self) -> bool {
        self.current_time > Duration::ZERO
            && !self.paused
            && !self.ended
            && self.ready_state > ReadyState::HaveCurrentData
    }
}

/// Consumer-facing preview the feed is bound to
pub trait VideoSurface: Send {
    /// Bind a feed and start playback
    fn attach(&mut self, feed: FeedHandle);

    /// Unbind the current feed, if any
    fn detach(&mut self);

    /// True while a feed is bound
    fn is_attached(&self) -> bool;

    /// Current playback status
    fn playback(&self) -> PlaybackState;

    /// Frame currently presented, if any
    fn current_frame(&self) -> Option<Arc<VideoFrame>>;
}

/// Video surface shared between the session manager and the scan loop
pub type SharedVideoSurface = Arc<Mutex<dyn VideoSurface>>;

/// Headless preview that presents whatever the attached feed last produced
///
/// Plays as soon as a feed is attached.
#[derive(Debug, Default)]
pub struct PreviewSurface {
    feed: Option<FeedHandle>,
    paused: bool,
}

impl PreviewSurface {
    /// Empty surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into the shared form the session manager expects
    pub fn shared() -> SharedVideoSurface {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Pause playback; the surface stops reporting live
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume playback
    pub fn play(&mut self) {
        self.paused = false;
    }
}

impl VideoSurface for PreviewSurface {
    fn attach(&mut self, feed: FeedHandle) {
        self.feed = Some(feed);
        self.paused = false;
    }

    fn detach(&mut self) {
        self.feed = None;
        self.paused = true;
    }

    fn is_attached(&self) -> bool {
        self.feed.is_some()
    }

    fn playback(&self) -> PlaybackState {
        let Some(feed) = &self.feed else {
            return PlaybackState::DETACHED;
        };
        let ended = !feed.is_active();
        match feed.latest_frame() {
            Some(frame) => PlaybackState {
                current_time: frame.timestamp,
                paused: self.paused,
                ended,
                ready_state: ReadyState::HaveEnoughData,
            },
            None => PlaybackState {
                current_time: Duration::ZERO,
                paused: self.paused,
                ended,
                ready_state: ReadyState::HaveMetadata,
            },
        }
    }

    fn current_frame(&self) -> Option<Arc<VideoFrame>> {
        if self.paused {
            return None;
        }
        self.feed.as_ref().and_then(|feed| feed.latest_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FrameSlotFeed, stop_all_tracks};
    use image::RgbaImage;

    #[test]
    fn test_detached_surface_is_not_live() {
        let surface = PreviewSurface::new();
        assert!(!surface.is_attached());
        assert_eq!(surface.playback(), PlaybackState::DETACHED);
        assert!(!surface.playback().is_live_playing());
        assert!(surface.current_frame().is_none());
    }

    #[test]
    fn test_attached_without_frames_is_not_live() {
        let mut surface = PreviewSurface::new();
        surface.attach(Arc::new(FrameSlotFeed::new("cam")));
        let playback = surface.playback();
        assert_eq!(playback.ready_state, ReadyState::HaveMetadata);
        assert!(!playback.is_live_playing());
    }

    #[test]
    fn test_live_once_frames_flow() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        let mut surface = PreviewSurface::new();
        surface.attach(feed.clone());
        feed.push_frame_at(RgbaImage::new(4, 4), Duration::from_millis(33));
        assert!(surface.playback().is_live_playing());
        assert!(surface.current_frame().is_some());

        surface.pause();
        assert!(!surface.playback().is_live_playing());
        surface.play();
        assert!(surface.playback().is_live_playing());

        stop_all_tracks(feed.as_ref());
        assert!(!surface.playback().is_live_playing());
    }

    #[test]
    fn test_live_predicate_edges() {
        let live = PlaybackState {
            current_time: Duration::from_millis(1),
            paused: false,
            ended: false,
            ready_state: ReadyState::HaveFutureData,
        };
        assert!(live.is_live_playing());
        assert!(
            !PlaybackState {
                current_time: Duration::ZERO,
                ..live
            }
            .is_live_playing()
        );
        assert!(
            !PlaybackState {
                ready_state: ReadyState::HaveCurrentData,
                ..live
            }
            .is_live_playing()
        );
        assert!(!PlaybackState { ended: true, ..live }.is_live_playing());
    }
}
