//! Copying the live video frame into the sampling bitmap

use crate::capture::VideoFrame;
use crate::error::SampleError;
use crate::surface::{BitmapSurface, SharedVideoSurface, VideoSurface};
use std::sync::PoisonError;

/// Pixels read back from the bitmap surface for one scan cycle
///
/// Borrowed from the surface: the buffer is overwritten on the next tick.
#[derive(Debug, Clone, Copy)]
pub struct SampledFrame<'a> {
    /// RGBA, 4 bytes per pixel, row-major
    pub pixels: &'a [u8],
    /// Bitmap width
    pub width: u32,
    /// Bitmap height
    pub height: u32,
}

/// Copies the current video frame into the sampling bitmap
pub struct FrameSampler;

impl FrameSampler {
    /// Draw the frame currently presented by `video` into `bitmap` and read
    /// the pixels back
    ///
    /// Fails with [`SampleError::SurfaceUnavailable`] when the video surface is
    /// detached or has no frame, or when the bitmap has no area.
    pub fn sample<'a>(
        video: &dyn VideoSurface,
        bitmap: &'a mut BitmapSurface,
    ) -> Result<SampledFrame<'a>, SampleError> {
        if !video.is_attached() {
            return Err(SampleError::SurfaceUnavailable);
        }
        let frame = video.current_frame();
        Self::draw(frame.as_deref(), bitmap)
    }

    /// Same as [`FrameSampler::sample`] for a shared surface
    ///
    /// The surface lock is only held while grabbing the current frame; scaling
    /// happens after it is released.
    pub fn sample_shared<'a>(
        video: &SharedVideoSurface,
        bitmap: &'a mut BitmapSurface,
    ) -> Result<SampledFrame<'a>, SampleError> {
        let frame = {
            let video = video.lock().unwrap_or_else(PoisonError::into_inner);
            if !video.is_attached() {
                return Err(SampleError::SurfaceUnavailable);
            }
            video.current_frame()
        };
        Self::draw(frame.as_deref(), bitmap)
    }

    fn draw<'a>(
        frame: Option<&VideoFrame>,
        bitmap: &'a mut BitmapSurface,
    ) -> Result<SampledFrame<'a>, SampleError> {
        if !bitmap.is_available() {
            return Err(SampleError::SurfaceUnavailable);
        }
        let frame = frame.ok_or(SampleError::SurfaceUnavailable)?;
        bitmap.draw(&frame.image);
        Ok(SampledFrame {
            pixels: bitmap.pixels(),
            width: bitmap.width(),
            height: bitmap.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameSlotFeed;
    use crate::surface::PreviewSurface;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_detached_video_is_unavailable() {
        let video = PreviewSurface::new();
        let mut bitmap = BitmapSurface::new(8, 8);
        assert_eq!(
            FrameSampler::sample(&video, &mut bitmap).unwrap_err(),
            SampleError::SurfaceUnavailable
        );
        assert_eq!(bitmap.draw_count(), 0);
    }

    #[test]
    fn test_sample_scales_to_bitmap() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        feed.push_frame_at(
            RgbaImage::from_pixel(320, 240, Rgba([10, 20, 30, 255])),
            Duration::from_millis(5),
        );
        let mut video = PreviewSurface::new();
        video.attach(feed);
        let mut bitmap = BitmapSurface::new(32, 24);

        let sampled = FrameSampler::sample(&video, &mut bitmap).unwrap();
        assert_eq!((sampled.width, sampled.height), (32, 24));
        assert_eq!(sampled.pixels.len(), 32 * 24 * 4);
        assert_eq!(&sampled.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_zero_area_bitmap_is_unavailable() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        feed.push_frame(RgbaImage::new(4, 4));
        let mut video = PreviewSurface::new();
        video.attach(feed);
        let mut bitmap = BitmapSurface::new(0, 0);
        assert!(FrameSampler::sample(&video, &mut bitmap).is_err());
    }

    #[test]
    fn test_sample_shared_surface() {
        let feed = Arc::new(FrameSlotFeed::new("cam"));
        feed.push_frame(RgbaImage::new(16, 16));
        let shared = PreviewSurface::shared();
        assert!(FrameSampler::sample_shared(&shared, &mut BitmapSurface::new(4, 4)).is_err());

        shared.lock().unwrap().attach(feed);
        let mut bitmap = BitmapSurface::new(4, 4);
        let sampled = FrameSampler::sample_shared(&shared, &mut bitmap).unwrap();
        assert_eq!(sampled.pixels.len(), 64);
    }
}
