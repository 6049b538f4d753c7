//! Outcome of a single scan cycle

use std::time::Duration;

/// Result of one decode attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodeOutcome {
    /// A non-empty payload was decoded
    Hit(String),
    /// No code found in the frame. A normal outcome, not an error
    Miss,
}

impl DecodeOutcome {
    /// Normalize a decoder return value; empty payloads count as misses
    pub fn from_decoded(decoded: Option<String>) -> Self {
        match decoded {
            Some(payload) if !payload.is_empty() => DecodeOutcome::Hit(payload),
            _ => DecodeOutcome::Miss,
        }
    }

    /// The payload on a hit
    pub fn payload(&self) -> Option<&str> {
        match self {
            DecodeOutcome::Hit(payload) => Some(payload),
            DecodeOutcome::Miss => None,
        }
    }

    /// True on a hit
    pub fn is_hit(&self) -> bool {
        matches!(self, DecodeOutcome::Hit(_))
    }
}

/// One sample-and-decode attempt on the scan schedule
///
/// The sampled pixels are not retained; only the outcome survives the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCycle {
    /// Monotonic per scan loop, starting at 1
    pub sequence: u64,
    /// What the decoder saw
    pub outcome: DecodeOutcome,
    /// Wall time spent sampling and decoding
    pub elapsed: Duration,
}
