use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use live_qr::capture::FrameSlotFeed;
use live_qr::decoder::{Decoder, RqrrDecoder};
use live_qr::scan::FrameSampler;
use live_qr::surface::{BitmapSurface, PreviewSurface, VideoSurface};
use live_qr::utils::grayscale::{rgba_to_grayscale, rgba_to_grayscale_parallel};
use std::sync::Arc;

fn checkerboard(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

fn bench_bitmap_draw_same_size(c: &mut Criterion) {
    let frame = checkerboard(640, 480);
    let mut bitmap = BitmapSurface::new(640, 480);
    c.bench_function("bitmap_draw_640x480_to_640x480", |b| {
        b.iter(|| bitmap.draw(black_box(&frame)))
    });
}

fn bench_bitmap_draw_scaled(c: &mut Criterion) {
    let frame = checkerboard(1280, 720);
    let mut bitmap = BitmapSurface::new(640, 480);
    c.bench_function("bitmap_draw_1280x720_to_640x480", |b| {
        b.iter(|| bitmap.draw(black_box(&frame)))
    });
}

fn bench_sample_preview(c: &mut Criterion) {
    let feed = Arc::new(FrameSlotFeed::new("bench"));
    feed.push_frame(checkerboard(1280, 720));
    let mut video = PreviewSurface::new();
    video.attach(feed);
    let mut bitmap = BitmapSurface::new(640, 480);
    c.bench_function("frame_sampler_sample_1280x720", |b| {
        b.iter(|| {
            let sampled = FrameSampler::sample(&video, &mut bitmap).map(|s| s.pixels.len());
            black_box(sampled)
        })
    });
}

fn bench_grayscale(c: &mut Criterion) {
    let pixels = vec![128u8; 640 * 480 * 4];
    c.bench_function("rgba_to_grayscale_640x480", |b| {
        b.iter(|| rgba_to_grayscale(black_box(&pixels), 640, 480))
    });
    c.bench_function("rgba_to_grayscale_parallel_640x480", |b| {
        b.iter(|| rgba_to_grayscale_parallel(black_box(&pixels), 640, 480))
    });

    let large = vec![128u8; 1920 * 1080 * 4];
    c.bench_function("rgba_to_grayscale_1920x1080", |b| {
        b.iter(|| rgba_to_grayscale(black_box(&large), 1920, 1080))
    });
    c.bench_function("rgba_to_grayscale_parallel_1920x1080", |b| {
        b.iter(|| rgba_to_grayscale_parallel(black_box(&large), 1920, 1080))
    });
}

fn bench_decode_miss(c: &mut Criterion) {
    let frame = checkerboard(640, 480);
    let decoder = RqrrDecoder::new();
    c.bench_function("rqrr_decode_miss_640x480", |b| {
        b.iter(|| decoder.decode(black_box(frame.as_raw()), 640, 480))
    });
    let parallel = RqrrDecoder::new().with_parallel(true);
    c.bench_function("rqrr_decode_miss_parallel_640x480", |b| {
        b.iter(|| parallel.decode(black_box(frame.as_raw()), 640, 480))
    });
}

criterion_group!(
    benches,
    bench_bitmap_draw_same_size,
    bench_bitmap_draw_scaled,
    bench_sample_preview,
    bench_grayscale,
    bench_decode_miss
);
criterion_main!(benches);
