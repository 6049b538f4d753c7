//! Convert RGBA pixels to 8-bit luminance
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8

use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Frames at least this large are worth splitting across rayon workers
pub const PARALLEL_MIN_PIXELS: usize = 640 * 480;

#[inline]
fn luma(px: &[u8]) -> u8 {
    let lum = (COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8;
    lum.min(255) as u8
}

/// Convert RGBA image to grayscale (ignores alpha channel)
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut gray = Vec::with_capacity(width * height);
    rgba_to_grayscale_into(rgba, width, height, &mut gray);
    gray
}

/// Convert RGBA to grayscale into a reusable buffer
///
/// `gray` is resized to `width * height`; pixels missing from a short input
/// are left black.
pub fn rgba_to_grayscale_into(rgba: &[u8], width: usize, height: usize, gray: &mut Vec<u8>) {
    let pixel_count = width * height;
    gray.clear();
    gray.resize(pixel_count, 0);
    for (out, px) in gray.iter_mut().zip(rgba.chunks_exact(4)) {
        *out = luma(px);
    }
}

/// Convert RGBA to grayscale using parallel processing
/// Processes rows in parallel for multi-core speedup
pub fn rgba_to_grayscale_parallel(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut gray = vec![0u8; pixel_count];
    if width == 0 || rgba.len() < pixel_count * 4 {
        rgba_to_grayscale_into(rgba, width, height, &mut gray);
        return gray;
    }

    gray.par_chunks_mut(width)
        .zip(rgba.par_chunks(width * 4))
        .for_each(|(row, src)| {
            for (out, px) in row.iter_mut().zip(src.chunks_exact(4)) {
                *out = luma(px);
            }
        });

    gray
}
