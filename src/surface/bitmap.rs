//! Reusable off-screen bitmap the scan loop draws frames into
//!
//! Sized once at session start; every draw overwrites the same buffer so the
//! loop allocates nothing per tick for its sampling target.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Fixed-size RGBA drawing target
#[derive(Debug, Clone)]
pub struct BitmapSurface {
    canvas: RgbaImage,
    draws: u64,
}

impl BitmapSurface {
    /// Surface of `width` x `height` pixels, initially transparent black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            draws: 0,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// False for a zero-area surface, which cannot be drawn into
    pub fn is_available(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Draw `frame` stretched over the whole surface
    ///
    /// The frame's aspect ratio is not preserved; the surface never changes
    /// size to follow the camera.
    pub fn draw(&mut self, frame: &RgbaImage) {
        if !self.is_available() {
            return;
        }
        if frame.dimensions() == self.canvas.dimensions() {
            self.canvas.copy_from_slice(frame.as_raw());
        } else {
            let scaled = imageops::resize(frame, self.width(), self.height(), FilterType::Triangle);
            self.canvas.copy_from_slice(scaled.as_raw());
        }
        self.draws += 1;
    }

    /// Raw pixels: 4 bytes per pixel, row-major
    pub fn pixels(&self) -> &[u8] {
        self.canvas.as_raw()
    }

    /// Number of frames drawn so far
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Reset every pixel to transparent black (keeps the allocation)
    pub fn clear(&mut self) {
        self.canvas.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_surface_size_is_fixed() {
        let mut surface = BitmapSurface::new(64, 48);
        surface.draw(&RgbaImage::new(1920, 1080));
        assert_eq!((surface.width(), surface.height()), (64, 48));
        assert_eq!(surface.pixels().len(), 64 * 48 * 4);
        assert_eq!(surface.draw_count(), 1);
    }

    #[test]
    fn test_draw_overwrites_previous_contents() {
        let mut surface = BitmapSurface::new(8, 8);
        surface.draw(&RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])));
        assert!(surface.pixels().iter().all(|&b| b == 255));

        surface.draw(&RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255])));
        assert!(surface.pixels().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn test_zero_area_surface_is_unavailable() {
        let mut surface = BitmapSurface::new(0, 10);
        assert!(!surface.is_available());
        surface.draw(&RgbaImage::new(4, 4));
        assert_eq!(surface.draw_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut surface = BitmapSurface::new(2, 2);
        surface.draw(&RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 9])));
        surface.clear();
        assert!(surface.pixels().iter().all(|&b| b == 0));
    }
}
