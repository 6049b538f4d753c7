//! Periodic sample-and-decode loop
//!
//! - `sampler`: draws the current video frame into the sampling bitmap
//! - `controller`: cancellable periodic task issuing scan cycles
//! - `policy`: sticky last-result update rule

pub mod controller;
pub mod policy;
pub mod sampler;

pub use controller::{
    LivePredicate, ScanLoopController, ScanLoopHandle, ScanStats, default_live_predicate,
};
pub use sampler::{FrameSampler, SampledFrame};
