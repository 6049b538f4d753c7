use super::Decoder;
use crate::utils::grayscale::{PARALLEL_MIN_PIXELS, rgba_to_grayscale, rgba_to_grayscale_parallel};
use rqrr::PreparedImage;
use tracing::trace;

/// QR decoder built on `rqrr`
///
/// Converts the sampled RGBA bitmap to luminance, detects grids and returns
/// the first one that decodes. Only one code per frame is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder {
    parallel: bool,
}

impl RqrrDecoder {
    /// Single-threaded decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Split grayscale conversion of large frames across rayon workers
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl Decoder for RqrrDecoder {
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<String> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || pixels.len() < w * h * 4 {
            return None;
        }

        let gray = if self.parallel && w * h >= PARALLEL_MIN_PIXELS {
            rgba_to_grayscale_parallel(pixels, w, h)
        } else {
            rgba_to_grayscale(pixels, w, h)
        };

        let mut prepared = PreparedImage::prepare_from_greyscale(w, h, |x, y| gray[y * w + x]);
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), "rqrr grid detection");
        grids
            .iter()
            .find_map(|grid| grid.decode().ok().map(|(_, content)| content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_has_no_code() {
        let pixels = vec![255u8; 64 * 48 * 4];
        assert_eq!(RqrrDecoder::new().decode(&pixels, 64, 48), None);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let pixels = vec![0u8; 10];
        assert_eq!(RqrrDecoder::new().decode(&pixels, 64, 48), None);
        assert_eq!(RqrrDecoder::new().decode(&[], 0, 0), None);
    }

    #[test]
    fn test_parallel_blank_frame() {
        let pixels = vec![0u8; 640 * 480 * 4];
        let decoder = RqrrDecoder::new().with_parallel(true);
        assert_eq!(decoder.decode(&pixels, 640, 480), None);
    }
}
