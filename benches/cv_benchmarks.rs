//! Benchmarks for the six session operations on synthetic images.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cv_core::PixelBuffer;
use cv_session::{vision, Operation};
use image::{Rgb, RgbImage};
use std::time::Duration;

/// Checkerboard with a diagonal gradient, so every operation has work to do.
fn create_test_image(width: u32, height: u32) -> PixelBuffer {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let check = if ((x / 16) + (y / 16)) % 2 == 0 { 200 } else { 40 };
        Rgb([check, ((x + y) % 256) as u8, (x % 256) as u8])
    });
    PixelBuffer::from_rgb_image(&img).expect("non-empty benchmark image")
}

fn benchmark_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_operations");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(20);

    for size in [128u32, 256, 512] {
        let input = create_test_image(size, size);
        for op in Operation::menu() {
            if matches!(op, Operation::FaceDetect(_)) {
                continue;
            }
            group.bench_with_input(
                BenchmarkId::new(op.name(), format!("{size}x{size}")),
                &input,
                |b, input| {
                    b.iter(|| {
                        let _ = vision::run(black_box(&op), black_box(input), None);
                    });
                },
            );
        }
    }

    group.finish();
}

fn benchmark_grayscale_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("grayscale_conversion");
    let input = create_test_image(1024, 768);

    group.bench_function("bgr_1024x768", |b| {
        b.iter(|| cv_imgproc::to_grayscale(black_box(&input)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_operations, benchmark_grayscale_conversion);
criterion_main!(benches);
