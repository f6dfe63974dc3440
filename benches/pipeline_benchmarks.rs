//! Benchmarks for the detection pipeline and the animation step

use animatronic_eyes::animation::EyeAnimator;
use animatronic_eyes::channel::{decode, encode};
use animatronic_eyes::config::{AnimationConfig, DetectionConfig};
use animatronic_eyes::coordinate::{pixel_to_gaze, MotionTarget};
use animatronic_eyes::motion::MotionDetector;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use opencv::{
    core::{Mat, Rect, Scalar, CV_8UC3},
    imgproc,
    prelude::*,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

fn frame_pair(width: i32, height: i32) -> (Mat, Mat) {
    let background = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0)).unwrap();
    let mut moved = background.clone();
    let side = width / 16;
    imgproc::rectangle(
        &mut moved,
        Rect::new(width / 2 - side / 2, height / 2 - side / 2, side, side),
        Scalar::all(255.0),
        -1,
        imgproc::LINE_8,
        0,
    )
    .unwrap();
    (background, moved)
}

/// Benchmark one detection cycle at common camera resolutions
fn bench_motion_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion_detection");
    group.measurement_time(Duration::from_secs(10));

    for (width, height) in [(320, 240), (640, 480), (1280, 720)] {
        let (background, moved) = frame_pair(width, height);
        group.bench_with_input(
            BenchmarkId::new("process", format!("{width}x{height}")),
            &(background, moved),
            |b, (background, moved)| {
                let mut detector = MotionDetector::new(&DetectionConfig::default()).unwrap();
                let mut flip = false;
                b.iter(|| {
                    flip = !flip;
                    let frame = if flip { moved } else { background };
                    black_box(detector.process(black_box(frame)).unwrap())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the animation tick
fn bench_animator_step(c: &mut Criterion) {
    c.bench_function("animator_step", |b| {
        let mut animator = EyeAnimator::with_rng(AnimationConfig::default(), StdRng::seed_from_u64(0));
        let mut now = Instant::now();
        b.iter(|| {
            now += Duration::from_millis(10);
            black_box(animator.step(now))
        });
    });
}

/// Benchmark coordinate mapping and the wire codec
fn bench_transform_and_codec(c: &mut Criterion) {
    c.bench_function("pixel_to_gaze", |b| {
        b.iter(|| black_box(pixel_to_gaze(black_box(MotionTarget::new(123, 87)))));
    });

    let state = EyeAnimator::with_rng(AnimationConfig::default(), StdRng::seed_from_u64(0)).state();
    c.bench_function("encode_decode", |b| {
        b.iter(|| black_box(decode(&encode(black_box(&state))).unwrap()));
    });
}

criterion_group!(benches, bench_motion_detection, bench_animator_step, bench_transform_and_codec);
criterion_main!(benches);
