//! Capture session manager
//!
//! Owns the camera feed and the lifecycle state machine gating the scan loop.
//!
//! START FLOW:
//! 1. `Idle -> Acquiring`, ask the camera provider for a rear-facing,
//!    video-only feed
//! 2. Granted: attach the feed to the video surface, publish it, go `Active`
//!    and arm the scan loop (which waits for live playback on its own)
//! 3. Refused: back to `Idle`, report `CaptureUnavailable` once
//!
//! STOP FLOW:
//! 1. `Active -> Stopping`, disarm the scan loop and wait for it to exit
//! 2. Stop every track, detach the surface, clear the published feed
//! 3. `Stopping -> Idle`
//!
//! A stop that lands while acquiring marks the pending request cancelled; when
//! the platform answers, a granted feed is released on the spot instead of
//! becoming active.

use super::camera::CameraProvider;
use super::feed::{FeedHandle, stop_all_tracks};
use crate::config::ScanConfig;
use crate::decoder::Decoder;
use crate::error::{AcquireError, ConfigError, SessionError};
use crate::models::{CaptureSession, LifecycleEvent, LifecycleState};
use crate::scan::{
    LivePredicate, ScanLoopController, ScanLoopHandle, ScanStats, default_live_predicate,
};
use crate::state::ScannerState;
use crate::surface::{BitmapSurface, SharedVideoSurface, VideoSurface};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// What a call to [`CaptureSessionManager::start`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartOutcome {
    /// A feed was acquired and the session is `Active`
    Started,
    /// The manager was not `Idle`; nothing happened
    AlreadyRunning,
    /// `stop()` arrived while acquiring; any granted feed was released
    Cancelled,
}

#[derive(Debug)]
struct PendingAcquisition {
    generation: u64,
    cancelled: bool,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    pending: Option<PendingAcquisition>,
    session: Option<CaptureSession>,
    scan: Option<ScanLoopHandle>,
}

/// Starts and stops capture sessions and exposes their observable state
///
/// All transitions happen under one lock, so concurrent `start()`/`stop()`
/// calls are serialized and at most one acquisition is ever in flight.
pub struct CaptureSessionManager {
    camera: Arc<dyn CameraProvider>,
    surface: SharedVideoSurface,
    config: ScanConfig,
    controller: ScanLoopController,
    ready: LivePredicate,
    state: ScannerState,
    inner: Mutex<Inner>,
}

impl CaptureSessionManager {
    /// Manager bound to a camera provider, a preview surface and a decoder
    pub fn new(
        camera: Arc<dyn CameraProvider>,
        surface: SharedVideoSurface,
        decoder: Arc<dyn Decoder>,
        config: ScanConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = ScannerState::new();
        let controller = ScanLoopController::new(config.scan_period(), decoder, state.clone());
        Ok(Self {
            camera,
            surface,
            config,
            controller,
            ready: default_live_predicate(),
            state,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Replace the check deciding when the video surface counts as live
    pub fn with_live_predicate(mut self, ready: LivePredicate) -> Self {
        self.ready = ready;
        self
    }

    /// Observable lifecycle, feed and last result
    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> LifecycleState {
        self.state.lifecycle()
    }

    /// Most recent decoded payload
    pub fn last_result(&self) -> Option<String> {
        self.state.last_result()
    }

    /// Configuration the manager was built with
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan counters across every session this manager ran
    pub fn stats(&self) -> ScanStats {
        self.controller.stats()
    }

    /// True once the active session's video surface has gone live
    pub fn is_live(&self) -> bool {
        self.lock_inner()
            .session
            .as_ref()
            .is_some_and(CaptureSession::is_live)
    }

    /// Acquire a feed and arm the scan loop
    ///
    /// No-op unless `Idle`. On refusal the manager is back in `Idle` and a
    /// fresh `start()` may be attempted; nothing is retried automatically.
    pub async fn start(&self) -> Result<StartOutcome, SessionError> {
        let generation = {
            let mut inner = self.lock_inner();
            if !self.transition(LifecycleEvent::StartRequested) {
                debug!(state = %self.state.lifecycle(), "start ignored, session not idle");
                return Ok(StartOutcome::AlreadyRunning);
            }
            inner.generation += 1;
            inner.pending = Some(PendingAcquisition {
                generation: inner.generation,
                cancelled: false,
            });
            inner.generation
        };

        let mut pending = PendingGuard {
            manager: self,
            generation,
            settled: false,
        };
        debug!(generation, facing = ?self.config.facing, "requesting camera feed");
        let acquired = self.camera.acquire(&self.config.constraints()).await;
        pending.settled = true;

        self.settle(generation, acquired)
    }

    /// Halt the scan loop and release the feed
    ///
    /// No-op when `Idle`. When this returns after an active session, no
    /// further scan cycle runs and every track is stopped; a call landing
    /// while another `stop()` is tearing the session down waits for it.
    pub async fn stop(&self) {
        let action = {
            let mut inner = self.lock_inner();
            match self.state.lifecycle() {
                LifecycleState::Idle => StopAction::Ignore,
                LifecycleState::Stopping if inner.session.is_some() => {
                    StopAction::AwaitRelease(self.state.subscribe_lifecycle())
                }
                LifecycleState::Stopping => StopAction::Ignore,
                LifecycleState::Acquiring => {
                    if let Some(pending) = inner.pending.as_mut() {
                        pending.cancelled = true;
                    }
                    self.transition(LifecycleEvent::StopRequested);
                    debug!("stop requested while acquiring; feed dropped once the camera answers");
                    StopAction::Ignore
                }
                LifecycleState::Active => {
                    self.transition(LifecycleEvent::StopRequested);
                    StopAction::Teardown(inner.scan.take())
                }
            }
        };

        match action {
            StopAction::Ignore => {
                trace!(state = %self.state.lifecycle(), "stop has nothing to release");
            }
            StopAction::AwaitRelease(mut lifecycle) => {
                debug!("stop already in progress, waiting for release");
                // The sender lives in `self.state`, so this never errs
                let _ = lifecycle
                    .wait_for(|state| *state != LifecycleState::Stopping)
                    .await;
            }
            StopAction::Teardown(scan) => {
                // Releases even if this future is dropped mid-disarm
                let teardown = Teardown { manager: self };
                if let Some(scan) = scan {
                    scan.disarm().await;
                }
                drop(teardown);
            }
        }
    }

    fn settle(
        &self,
        generation: u64,
        acquired: Result<FeedHandle, AcquireError>,
    ) -> Result<StartOutcome, SessionError> {
        let mut inner = self.lock_inner();
        let cancelled = match inner.pending.take() {
            Some(pending) if pending.generation == generation => pending.cancelled,
            other => {
                inner.pending = other;
                true
            }
        };

        if cancelled {
            if let Ok(feed) = acquired {
                let stopped = stop_all_tracks(feed.as_ref());
                debug!(generation, stopped, "discarded feed granted after stop");
            }
            self.transition(LifecycleEvent::Released);
            return Ok(StartOutcome::Cancelled);
        }

        let feed = match acquired {
            Ok(feed) => feed,
            Err(err) => {
                self.transition(LifecycleEvent::AcquireFailed);
                warn!(generation, %err, "camera acquisition failed");
                return Err(SessionError::CaptureUnavailable(err));
            }
        };

        let session = CaptureSession::new(Arc::clone(&feed));
        self.lock_surface().attach(Arc::clone(&feed));
        self.state.set_feed(Some(Arc::clone(&feed)));
        self.transition(LifecycleEvent::AcquireSucceeded);

        let (width, height) = self.config.sample_size();
        let scan = self.controller.arm_when_live(
            Arc::clone(&self.surface),
            BitmapSurface::new(width, height),
            Arc::clone(&self.ready),
            session.liveness(),
        );
        info!(
            generation,
            feed = feed.label(),
            tracks = feed.tracks().len(),
            sample_width = width,
            sample_height = height,
            "capture session active"
        );
        inner.session = Some(session);
        inner.scan = Some(scan);
        Ok(StartOutcome::Started)
    }

    fn release_session(&self) {
        let mut inner = self.lock_inner();
        let stopped = inner
            .session
            .take()
            .map(|mut session| session.release())
            .unwrap_or(0);
        self.lock_surface().detach();
        self.state.set_feed(None);
        self.transition(LifecycleEvent::Released);
        info!(tracks = stopped, "capture stopped");
    }

    fn abandon(&self, generation: u64) {
        let mut inner = self.lock_inner();
        if !inner
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation)
        {
            return;
        }
        inner.pending = None;
        let event = match self.state.lifecycle() {
            LifecycleState::Acquiring => LifecycleEvent::AcquireFailed,
            _ => LifecycleEvent::Released,
        };
        self.transition(event);
        debug!(generation, "start abandoned before the camera answered");
    }

    /// Apply `event` to the lifecycle. Callers hold the inner lock.
    fn transition(&self, event: LifecycleEvent) -> bool {
        let current = self.state.lifecycle();
        match current.on(event) {
            Some(next) => {
                self.state.set_lifecycle(next);
                true
            }
            None => {
                trace!(state = %current, ?event, "lifecycle event ignored");
                false
            }
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_surface(&self) -> MutexGuard<'_, dyn VideoSurface + 'static> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CaptureSessionManager {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        // Dropping the handle cancels the loop
        inner.scan.take();
        if let Some(mut session) = inner.session.take() {
            session.release();
            self.surface
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .detach();
        }
    }
}

impl std::fmt::Debug for CaptureSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionManager")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

enum StopAction {
    Ignore,
    AwaitRelease(watch::Receiver<LifecycleState>),
    Teardown(Option<ScanLoopHandle>),
}

struct PendingGuard<'a> {
    manager: &'a CaptureSessionManager,
    generation: u64,
    settled: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.manager.abandon(self.generation);
        }
    }
}

struct Teardown<'a> {
    manager: &'a CaptureSessionManager,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.manager.release_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConstraints, FrameSlotFeed, MediaFeed};
    use crate::surface::PreviewSurface;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCamera {
        requests: AtomicUsize,
        feed: Arc<FrameSlotFeed>,
    }

    #[async_trait]
    impl CameraProvider for CountingCamera {
        async fn acquire(
            &self,
            constraints: &CaptureConstraints,
        ) -> Result<FeedHandle, AcquireError> {
            assert!(!constraints.audio);
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.feed.clone() as FeedHandle)
        }
    }

    fn manager(feed: Arc<FrameSlotFeed>) -> (CaptureSessionManager, Arc<CountingCamera>) {
        let camera = Arc::new(CountingCamera {
            requests: AtomicUsize::new(0),
            feed,
        });
        let decoder: Arc<dyn Decoder> = Arc::new(|_: &[u8], _: u32, _: u32| None::<String>);
        let manager = CaptureSessionManager::new(
            camera.clone(),
            PreviewSurface::shared(),
            decoder,
            ScanConfig::default(),
        )
        .unwrap();
        (manager, camera)
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let decoder: Arc<dyn Decoder> = Arc::new(|_: &[u8], _: u32, _: u32| None::<String>);
        let camera = Arc::new(CountingCamera {
            requests: AtomicUsize::new(0),
            feed: Arc::new(FrameSlotFeed::new("cam")),
        });
        let result = CaptureSessionManager::new(
            camera,
            PreviewSurface::shared(),
            decoder,
            ScanConfig::default().with_sample_size(0, 0),
        );
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_a_noop() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        let (manager, camera) = manager(feed);
        assert_eq!(manager.start().await, Ok(StartOutcome::Started));
        assert_eq!(manager.start().await, Ok(StartOutcome::AlreadyRunning));
        assert_eq!(camera.requests.load(Ordering::SeqCst), 1);
        assert_eq!(manager.lifecycle(), LifecycleState::Active);
        manager.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_feed() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        {
            let (manager, _camera) = manager(feed.clone());
            manager.start().await.unwrap();
            assert!(feed.is_active());
        }
        assert!(!feed.is_active());
    }
}
