//! live_qr - live camera QR scanning loop
//!
//! Acquires a rear-facing camera feed, binds it to a preview surface and,
//! once the preview is actually playing, samples a frame on a fixed cadence
//! and hands it to a QR decoder. The last decoded payload is sticky: misses
//! never clear it and repeats do not re-publish it.
//!
//! ```no_run
//! use live_qr::{CaptureSessionManager, RqrrDecoder, ScanConfig};
//! use live_qr::surface::PreviewSurface;
//! use live_qr::tools::ReplayCamera;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let camera = Arc::new(ReplayCamera::from_dir("frames", 15));
//! let manager = CaptureSessionManager::new(
//!     camera,
//!     PreviewSurface::shared(),
//!     Arc::new(RqrrDecoder::new()),
//!     ScanConfig::from_env(),
//! )?;
//! manager.start().await?;
//! let mut results = manager.state().subscribe_last_result();
//! results.changed().await?;
//! println!("{:?}", *results.borrow());
//! manager.stop().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Camera providers, feeds and the capture session manager
pub mod capture;
/// Scan loop configuration
pub mod config;
/// QR decoder seam and the default rqrr-backed decoder
pub mod decoder;
/// Error types
pub mod error;
/// Core data structures (lifecycle, scan cycles, capture sessions)
pub mod models;
/// Periodic scan loop: sampling, decoding and result policy
pub mod scan;
/// Observable scanner state
pub mod state;
/// Video preview and sampling bitmap surfaces
pub mod surface;
/// Development helpers (replay camera, image loading)
pub mod tools;
/// Utility functions (grayscale conversion)
pub mod utils;

pub use capture::{CameraProvider, CaptureSessionManager, StartOutcome};
pub use config::ScanConfig;
pub use decoder::{Decoder, RqrrDecoder};
pub use error::{AcquireError, ConfigError, SampleError, SessionError};
pub use models::{DecodeOutcome, LifecycleState, ScanCycle};
pub use scan::ScanStats;
pub use state::ScannerState;
