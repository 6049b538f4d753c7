pub mod cycle;
pub mod lifecycle;
pub mod session;

pub use cycle::{DecodeOutcome, ScanCycle};
pub use lifecycle::{LifecycleEvent, LifecycleState};
pub use session::CaptureSession;
