//! Observable scanner state
//!
//! Three values are exposed to the presentation layer: the lifecycle state,
//! the live feed handle and the last decoded payload. Each has exactly one
//! update function; consumers subscribe through `tokio::sync::watch`
//! receivers instead of reading internal fields.

use crate::capture::FeedHandle;
use crate::models::LifecycleState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

struct Channels {
    lifecycle: watch::Sender<LifecycleState>,
    feed: watch::Sender<Option<FeedHandle>>,
    last_result: watch::Sender<Option<String>>,
}

/// Cloneable handle to the observable state
///
/// Clones share the same channels; dropping every clone tears the state down,
/// which is the only way the last result goes back to `None`.
#[derive(Clone)]
pub struct ScannerState {
    channels: Arc<Channels>,
}

impl ScannerState {
    /// Fresh state: `Idle`, no feed, no result
    pub fn new() -> Self {
        let (lifecycle, _) = watch::channel(LifecycleState::Idle);
        let (feed, _) = watch::channel(None);
        let (last_result, _) = watch::channel(None);
        Self {
            channels: Arc::new(Channels {
                lifecycle,
                feed,
                last_result,
            }),
        }
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> LifecycleState {
        *self.channels.lifecycle.borrow()
    }

    /// Watch lifecycle changes
    pub fn subscribe_lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.channels.lifecycle.subscribe()
    }

    /// Feed currently bound to the preview, if any
    pub fn feed(&self) -> Option<FeedHandle> {
        self.channels.feed.borrow().clone()
    }

    /// Watch the feed binding
    pub fn subscribe_feed(&self) -> watch::Receiver<Option<FeedHandle>> {
        self.channels.feed.subscribe()
    }

    /// Most recent decoded payload
    pub fn last_result(&self) -> Option<String> {
        self.channels.last_result.borrow().clone()
    }

    /// Watch the decoded payload
    pub fn subscribe_last_result(&self) -> watch::Receiver<Option<String>> {
        self.channels.last_result.subscribe()
    }

    pub(crate) fn set_lifecycle(&self, next: LifecycleState) {
        let previous = self.channels.lifecycle.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "lifecycle transition");
        }
    }

    pub(crate) fn set_feed(&self, feed: Option<FeedHandle>) {
        self.channels.feed.send_replace(feed);
    }

    /// Offer a decoded payload. Empty payloads and repeats of the current
    /// payload leave the state untouched; returns true when it changed.
    pub(crate) fn offer_result(&self, payload: &str) -> bool {
        if payload.is_empty() {
            return false;
        }
        let changed = self.channels.last_result.send_if_modified(|current| {
            if current.as_deref() == Some(payload) {
                return false;
            }
            *current = Some(payload.to_string());
            true
        });
        if changed {
            info!(payload, "new code decoded");
        }
        changed
    }
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScannerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerState")
            .field("lifecycle", &self.lifecycle())
            .field("feed", &self.feed().map(|feed| feed.label().to_string()))
            .field("last_result", &self.last_result())
            .finish()
    }
}
