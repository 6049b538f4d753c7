//! Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use live_qr::capture::{CaptureConstraints, FeedHandle, FrameSlotFeed};
use live_qr::surface::PreviewSurface;
use live_qr::{AcquireError, CameraProvider, CaptureSessionManager, Decoder, ScanConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Scan period used by every scenario
pub const PERIOD: Duration = Duration::from_millis(250);

/// Camera that grants or refuses according to a script
///
/// Requests beyond the script are granted. A gate, when installed, holds the
/// next request until the sender fires (or is dropped).
#[derive(Default)]
pub struct FakeCamera {
    script: Mutex<VecDeque<Result<(), AcquireError>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    feeds: Mutex<Vec<Arc<FrameSlotFeed>>>,
    requests: AtomicUsize,
    last_constraints: Mutex<Option<CaptureConstraints>>,
}

impl FakeCamera {
    pub fn granting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(results: Vec<Result<(), AcquireError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(results.into()),
            ..Self::default()
        })
    }

    /// Queue the answer for a later `acquire`
    pub fn push_result(&self, result: Result<(), AcquireError>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Hold the next `acquire` until the returned sender fires
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn feeds(&self) -> Vec<Arc<FrameSlotFeed>> {
        self.feeds.lock().unwrap().clone()
    }

    pub fn last_feed(&self) -> Arc<FrameSlotFeed> {
        self.feeds
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no feed granted yet")
    }

    pub fn last_constraints(&self) -> Option<CaptureConstraints> {
        *self.last_constraints.lock().unwrap()
    }
}

#[async_trait]
impl CameraProvider for FakeCamera {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<FeedHandle, AcquireError> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock().unwrap() = Some(*constraints);

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        next?;
        let feed = Arc::new(FrameSlotFeed::new(format!("fake-{n}")));
        self.feeds.lock().unwrap().push(Arc::clone(&feed));
        Ok(feed as FeedHandle)
    }
}

/// Decoder returning `outcomes` in order, then misses forever
pub fn scripted_decoder(outcomes: &[Option<&str>]) -> (Arc<dyn Decoder>, Arc<AtomicUsize>) {
    let queue: Arc<Mutex<VecDeque<Option<String>>>> = Arc::new(Mutex::new(
        outcomes.iter().map(|o| o.map(str::to_string)).collect(),
    ));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let decoder = move |_: &[u8], _: u32, _: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        queue.lock().unwrap().pop_front().flatten()
    };
    let decoder: Arc<dyn Decoder> = Arc::new(decoder);
    (decoder, calls)
}

/// Manager over `camera` with a small sampling bitmap
pub fn manager(camera: Arc<FakeCamera>, decoder: Arc<dyn Decoder>) -> Arc<CaptureSessionManager> {
    let config = ScanConfig::default()
        .with_scan_period(PERIOD)
        .with_sample_size(32, 24);
    Arc::new(
        CaptureSessionManager::new(camera, PreviewSurface::shared(), decoder, config)
            .expect("valid config"),
    )
}

/// Publish a frame so the preview reports live playback
pub fn push_live_frame(feed: &FrameSlotFeed) {
    let frame = RgbaImage::from_pixel(64, 48, Rgba([200, 200, 200, 255]));
    feed.push_frame_at(frame, Duration::from_millis(40));
}

/// Let spawned tasks run without advancing the clock
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
