//! Decode function seam
//!
//! The scan loop treats decoding as an opaque, side-effect free call:
//! `decode(pixels, width, height) -> payload | none`, invoked once per scan
//! period for as long as the session is active. Pixels are RGBA, 4 bytes per
//! pixel, row-major.

/// Default decoder over `rqrr`
pub mod rqrr_decoder;

pub use rqrr_decoder::RqrrDecoder;

/// Maps a pixel buffer to a decoded payload
pub trait Decoder: Send + Sync {
    /// Decode at most one code from `pixels`
    ///
    /// Returns `None` when no code is found. Must not panic on arbitrary input.
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<String>;
}

impl<F> Decoder for F
where
    F: Fn(&[u8], u32, u32) -> Option<String> + Send + Sync,
{
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<String> {
        self(pixels, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closures_are_decoders() {
        let decoder = |pixels: &[u8], w: u32, h: u32| {
            (pixels.len() == (w * h * 4) as usize).then(|| "sized".to_string())
        };
        assert_eq!(decoder.decode(&[0; 16], 2, 2).as_deref(), Some("sized"));
        assert_eq!(decoder.decode(&[0; 4], 2, 2), None);
    }
}
