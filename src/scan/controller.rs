//! Scan loop controller
//!
//! One tokio task per armed session. The task ticks on a fixed period, waits
//! for the video surface to report live playback, then runs one scan cycle
//! per tick: sample, decode, apply the result policy.
//!
//! Cycles run inline in the task, so they never overlap. When a decode takes
//! longer than the period the missed ticks are skipped rather than queued.

use super::policy;
use super::sampler::FrameSampler;
use crate::decoder::Decoder;
use crate::error::SampleError;
use crate::models::{DecodeOutcome, ScanCycle};
use crate::state::ScannerState;
use crate::surface::{BitmapSurface, PlaybackState, SharedVideoSurface};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Readiness check run against the video surface before scanning starts
pub type LivePredicate = Arc<dyn Fn(&PlaybackState) -> bool + Send + Sync>;

/// The standard check: position advanced, playing, enough data buffered
pub fn default_live_predicate() -> LivePredicate {
    Arc::new(PlaybackState::is_live_playing)
}

/// Counters accumulated across every loop armed by one controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Scan cycles run
    pub cycles: u64,
    /// Cycles that decoded a payload
    pub hits: u64,
    /// Cycles that found no code
    pub misses: u64,
    /// Ticks skipped because a surface was unavailable
    pub skipped: u64,
    /// Ticks spent waiting for the surface to go live
    pub waiting: u64,
    /// Cycles that took longer than the scan period
    pub overruns: u64,
}

#[derive(Debug, Default)]
struct ScanCounters {
    cycles: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    skipped: AtomicU64,
    waiting: AtomicU64,
    overruns: AtomicU64,
}

impl ScanCounters {
    fn snapshot(&self) -> ScanStats {
        ScanStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            waiting: self.waiting.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}

/// Arms and owns the periodic scan loop
pub struct ScanLoopController {
    period: Duration,
    decoder: Arc<dyn Decoder>,
    state: ScannerState,
    counters: Arc<ScanCounters>,
}

impl ScanLoopController {
    /// Controller issuing cycles every `period`, publishing hits into `state`
    pub fn new(period: Duration, decoder: Arc<dyn Decoder>, state: ScannerState) -> Self {
        Self {
            period,
            decoder,
            state,
            counters: Arc::new(ScanCounters::default()),
        }
    }

    /// Tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Counter snapshot
    pub fn stats(&self) -> ScanStats {
        self.counters.snapshot()
    }

    /// Spawn the scan loop on the current tokio runtime
    ///
    /// No cycle runs until `ready` accepts the surface's playback state; once
    /// it does, `live` is set and every later tick runs a cycle. The first tick
    /// fires one period after arming. Must be called from within a runtime.
    pub fn arm_when_live(
        &self,
        surface: SharedVideoSurface,
        bitmap: BitmapSurface,
        ready: LivePredicate,
        live: Arc<AtomicBool>,
    ) -> ScanLoopHandle {
        let cancel = CancellationToken::new();
        let task = ScanTask {
            period: self.period,
            decoder: Arc::clone(&self.decoder),
            state: self.state.clone(),
            counters: Arc::clone(&self.counters),
            surface,
            bitmap,
            ready,
            live: Arc::clone(&live),
            sequence: 0,
        };
        debug!(
            period_ms = self.period.as_millis() as u64,
            "scan loop armed, waiting for live video"
        );
        let handle = tokio::spawn(task.run(cancel.clone()));
        ScanLoopHandle {
            cancel,
            task: Some(handle),
            live,
        }
    }
}

/// Cancellation handle for an armed scan loop
///
/// Dropping the handle cancels the loop without waiting for it.
pub struct ScanLoopHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    live: Arc<AtomicBool>,
}

impl ScanLoopHandle {
    /// True once the loop has seen the surface go live
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// True when the loop task has exited
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Cancel the periodic timer and wait for the loop to exit
    ///
    /// A cycle already running completes first; none starts after this returns.
    pub async fn disarm(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if err.is_panic() {
                    warn!("scan loop task panicked");
                }
            }
        }
    }
}

impl Drop for ScanLoopHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct ScanTask {
    period: Duration,
    decoder: Arc<dyn Decoder>,
    state: ScannerState,
    counters: Arc<ScanCounters>,
    surface: SharedVideoSurface,
    bitmap: BitmapSurface,
    ready: LivePredicate,
    live: Arc<AtomicBool>,
    sequence: u64,
}

impl ScanTask {
    async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if !self.state.lifecycle().is_active() {
                trace!("scan tick outside active session");
                continue;
            }

            if !self.live.load(Ordering::Acquire) {
                if !self.surface_is_live() {
                    self.counters.waiting.fetch_add(1, Ordering::Relaxed);
                    trace!("video surface not live yet");
                    continue;
                }
                self.live.store(true, Ordering::Release);
                debug!("video surface live, scanning");
            }

            match self.run_cycle() {
                Ok(cycle) => trace!(
                    sequence = cycle.sequence,
                    hit = cycle.outcome.is_hit(),
                    elapsed_us = cycle.elapsed.as_micros() as u64,
                    "scan cycle"
                ),
                Err(err) => {
                    self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                    trace!(%err, "scan tick skipped");
                }
            }
        }

        debug!(cycles = self.sequence, "scan loop disarmed");
    }

    fn surface_is_live(&self) -> bool {
        let surface = self.surface.lock().unwrap_or_else(PoisonError::into_inner);
        (self.ready)(&surface.playback())
    }

    fn run_cycle(&mut self) -> Result<ScanCycle, SampleError> {
        let started = std::time::Instant::now();
        let sampled = FrameSampler::sample_shared(&self.surface, &mut self.bitmap)?;
        let decoded = self
            .decoder
            .decode(sampled.pixels, sampled.width, sampled.height);

        self.sequence += 1;
        let cycle = ScanCycle {
            sequence: self.sequence,
            outcome: DecodeOutcome::from_decoded(decoded),
            elapsed: started.elapsed(),
        };

        self.counters.cycles.fetch_add(1, Ordering::Relaxed);
        if cycle.outcome.is_hit() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
        }
        if cycle.elapsed > self.period {
            self.counters.overruns.fetch_add(1, Ordering::Relaxed);
            debug!(
                sequence = cycle.sequence,
                elapsed_ms = cycle.elapsed.as_millis() as u64,
                "scan cycle overran the period; next ticks skipped"
            );
        }

        policy::apply(&self.state, &cycle.outcome);
        Ok(cycle)
    }
}
