//! Result-update policy
//!
//! The last decoded result is sticky: a miss never clears it, and only a hit
//! carrying a different payload replaces it.

use crate::models::DecodeOutcome;
use crate::state::ScannerState;

/// Payload that should replace `current`, if any
pub fn replacement<'a>(current: Option<&str>, outcome: &'a DecodeOutcome) -> Option<&'a str> {
    match outcome.payload() {
        Some(payload) if !payload.is_empty() && current != Some(payload) => Some(payload),
        _ => None,
    }
}

/// Apply one cycle's outcome to the observable state; true if it changed
pub fn apply(state: &ScannerState, outcome: &DecodeOutcome) -> bool {
    let current = state.last_result();
    match replacement(current.as_deref(), outcome) {
        Some(payload) => state.offer_result(payload),
        None => false,
    }
}
