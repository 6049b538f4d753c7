//! Utility functions for image processing
//!
//! - Grayscale conversion (RGBA to luminance) feeding the default decoder

pub mod grayscale;
