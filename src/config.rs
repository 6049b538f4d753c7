//! Scan loop configuration
//!
//! Defaults are a 250 ms cadence, a 640x480
//! sampling bitmap and the rear-facing camera. Every knob can be overridden from the
//! environment; unparsable values fall back to the default.

use crate::capture::{CaptureConstraints, FacingMode};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default period between scan cycles
pub const DEFAULT_SCAN_PERIOD_MS: u64 = 250;
/// Default sampling bitmap width
pub const DEFAULT_SAMPLE_WIDTH: u32 = 640;
/// Default sampling bitmap height
pub const DEFAULT_SAMPLE_HEIGHT: u32 = 480;

const MAX_SAMPLE_SIDE: u32 = 4096;

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_facing(name: &str, default: FacingMode) -> FacingMode {
    match std::env::var(name) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => FacingMode::User,
            "environment" | "rear" | "back" => FacingMode::Environment,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Tunables for the capture session and scan loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Milliseconds between scan cycles
    pub scan_period_ms: u64,
    /// Width of the sampling bitmap, fixed for the lifetime of a session
    pub sample_width: u32,
    /// Height of the sampling bitmap, fixed for the lifetime of a session
    pub sample_height: u32,
    /// Which camera to ask the platform for
    pub facing: FacingMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_period_ms: DEFAULT_SCAN_PERIOD_MS,
            sample_width: DEFAULT_SAMPLE_WIDTH,
            sample_height: DEFAULT_SAMPLE_HEIGHT,
            facing: FacingMode::Environment,
        }
    }
}

impl ScanConfig {
    /// Defaults overridden by `QR_SCAN_PERIOD_MS`, `QR_SAMPLE_WIDTH`,
    /// `QR_SAMPLE_HEIGHT` and `QR_FACING`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`
    ///
    /// Period is clamped to 10..=60000 ms and each sample side to 1..=4096.
    pub fn with_env_overrides(self) -> Self {
        Self {
            scan_period_ms: parse_env_u64("QR_SCAN_PERIOD_MS", self.scan_period_ms)
                .clamp(10, 60_000),
            sample_width: parse_env_u32("QR_SAMPLE_WIDTH", self.sample_width)
                .clamp(1, MAX_SAMPLE_SIDE),
            sample_height: parse_env_u32("QR_SAMPLE_HEIGHT", self.sample_height)
                .clamp(1, MAX_SAMPLE_SIDE),
            facing: parse_env_facing("QR_FACING", self.facing),
        }
    }

    /// Override the scan period
    pub fn with_scan_period(mut self, period: Duration) -> Self {
        self.scan_period_ms = period.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Override the sampling bitmap size
    pub fn with_sample_size(mut self, width: u32, height: u32) -> Self {
        self.sample_width = width;
        self.sample_height = height;
        self
    }

    /// Reject values the scan loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.sample_width == 0 || self.sample_height == 0 {
            return Err(ConfigError::EmptySampleSize {
                width: self.sample_width,
                height: self.sample_height,
            });
        }
        Ok(())
    }

    /// Scan period as a `Duration`
    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_period_ms)
    }

    /// Sampling bitmap `(width, height)`
    pub fn sample_size(&self) -> (u32, u32) {
        (self.sample_width, self.sample_height)
    }

    /// Camera request derived from this config (video only, never audio)
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            facing: self.facing,
            audio: false,
        }
    }
}
