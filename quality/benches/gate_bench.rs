use criterion::{black_box, criterion_group, criterion_main, Criterion};

use facegate_quality::{average_brightness_rgba, frame_from_mesh, FrameQualityGate};
use facegate_types::{FaceLandmarkFrame, Point2D};

fn passing_frame() -> FaceLandmarkFrame {
    FaceLandmarkFrame {
        has_face: true,
        nose: Point2D::new(0.5, 0.5),
        left_ear: Point2D::new(0.3, 0.5),
        right_ear: Point2D::new(0.7, 0.5),
        eye_blink_left: 0.05,
        eye_blink_right: 0.05,
        average_brightness: 120.0,
    }
}

fn evaluate_passing_bench(c: &mut Criterion) {
    let gate = FrameQualityGate::default();
    let frame = passing_frame();

    c.bench_function("gate_evaluate_ok", |b| b.iter(|| gate.evaluate(black_box(&frame))));
}

fn evaluate_dark_bench(c: &mut Criterion) {
    let gate = FrameQualityGate::default();
    let mut frame = passing_frame();
    frame.average_brightness = 10.0;

    c.bench_function("gate_evaluate_too_dark", |b| {
        b.iter(|| gate.evaluate(black_box(&frame)))
    });
}

fn brightness_100x100_bench(c: &mut Criterion) {
    let pixels = [90u8, 110, 130, 255].repeat(100 * 100);

    c.bench_function("average_brightness_100x100", |b| {
        b.iter(|| average_brightness_rgba(black_box(&pixels)))
    });
}

fn mesh_extraction_bench(c: &mut Criterion) {
    let faces = vec![vec![Point2D::new(0.5, 0.5); 478]];

    c.bench_function("frame_from_mesh_478", |b| {
        b.iter(|| frame_from_mesh(black_box(&faces), &[], 120.0))
    });
}

criterion_group!(
    benches,
    evaluate_passing_bench,
    evaluate_dark_bench,
    brightness_100x100_bench,
    mesh_extraction_bench
);
criterion_main!(benches);
