//! Capture session lifecycle states and their transition table

use serde::{Deserialize, Serialize};

/// Lifecycle of the capture session
///
/// The scan loop only runs while `Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No feed held, ready for `start()`
    #[default]
    Idle,
    /// Waiting on the platform to grant or deny a camera feed
    Acquiring,
    /// Feed held and attached; the scan loop is armed
    Active,
    /// Tearing down the scan loop and releasing the feed
    Stopping,
}

/// Inputs driving [`LifecycleState`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// `start()` was called
    StartRequested,
    /// The platform granted a feed
    AcquireSucceeded,
    /// The platform refused a feed
    AcquireFailed,
    /// `stop()` was called
    StopRequested,
    /// Scan loop halted and every track released
    Released,
}

impl LifecycleState {
    /// Transition table. `None` means the event is not valid in this state
    /// and must be treated as a no-op.
    pub fn on(self, event: LifecycleEvent) -> Option<LifecycleState> {
        use LifecycleEvent::*;
        use LifecycleState::*;
        match (self, event) {
            (Idle, StartRequested) => Some(Acquiring),
            (Acquiring, AcquireSucceeded) => Some(Active),
            (Acquiring, AcquireFailed) => Some(Idle),
            (Acquiring, StopRequested) => Some(Stopping),
            (Active, StopRequested) => Some(Stopping),
            (Stopping, Released) => Some(Idle),
            _ => None,
        }
    }

    /// Fold a sequence of events, skipping invalid ones
    pub fn fold<I>(self, events: I) -> LifecycleState
    where
        I: IntoIterator<Item = LifecycleEvent>,
    {
        events
            .into_iter()
            .fold(self, |state, event| state.on(event).unwrap_or(state))
    }

    /// True while a loading indicator should be shown
    pub fn is_loading(self) -> bool {
        self == LifecycleState::Acquiring
    }

    /// True when the scan loop is allowed to run
    pub fn is_active(self) -> bool {
        self == LifecycleState::Active
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Acquiring => "acquiring",
            LifecycleState::Active => "active",
            LifecycleState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}
