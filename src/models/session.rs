//! The acquired feed held between `start()` and `stop()`

use crate::capture::{FeedHandle, stop_all_tracks};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// An acquired camera feed owned by the capture session manager
///
/// Dropping the session stops every track, so a session can never leak its
/// device even when teardown is skipped.
#[derive(Debug)]
pub struct CaptureSession {
    feed: FeedHandle,
    live: Arc<AtomicBool>,
    acquired_at: DateTime<Utc>,
    acquired_instant: Instant,
    released: bool,
}

impl CaptureSession {
    /// Wrap a freshly acquired feed
    pub fn new(feed: FeedHandle) -> Self {
        Self {
            feed,
            live: Arc::new(AtomicBool::new(false)),
            acquired_at: Utc::now(),
            acquired_instant: Instant::now(),
            released: false,
        }
    }

    /// The underlying feed
    pub fn feed(&self) -> &FeedHandle {
        &self.feed
    }

    /// True once the video surface has reported live playback
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Flag the scan loop flips when playback goes live
    pub(crate) fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }

    /// Wall-clock acquisition time
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Time since acquisition
    pub fn uptime(&self) -> Duration {
        self.acquired_instant.elapsed()
    }

    /// Stop every track. Returns the number of tracks that were still live
    pub fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;
        self.live.store(false, Ordering::Release);
        let stopped = stop_all_tracks(self.feed.as_ref());
        debug!(
            feed = self.feed.label(),
            stopped,
            uptime_ms = self.uptime().as_millis() as u64,
            "capture session released"
        );
        stopped
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FrameSlotFeed, MediaFeed};

    #[test]
    fn test_release_is_idempotent() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        let mut session = CaptureSession::new(feed.clone());
        assert!(!session.is_live());
        assert_eq!(session.release(), 1);
        assert_eq!(session.release(), 0);
        assert!(!feed.is_active());
    }

    #[test]
    fn test_drop_releases_tracks() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        {
            let session = CaptureSession::new(feed.clone());
            session.liveness().store(true, Ordering::Release);
            assert!(session.is_live());
        }
        assert!(!feed.is_active());
    }
}
