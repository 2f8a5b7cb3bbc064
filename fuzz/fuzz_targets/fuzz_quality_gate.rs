#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use facegate_quality::FrameQualityGate;
use facegate_types::{FaceLandmarkFrame, Point2D, QualityReason};

#[derive(Arbitrary, Debug)]
struct Input {
    has_face: bool,
    coords: [f32; 6],
    eye_blink_left: f32,
    eye_blink_right: f32,
    average_brightness: f32,
}

// Any float, NaN and infinities included, yields exactly one verdict whose
// `ok` flag agrees with its reason.
fuzz_target!(|input: Input| {
    let [nx, ny, lx, ly, rx, ry] = input.coords;
    let frame = FaceLandmarkFrame {
        has_face: input.has_face,
        nose: Point2D { x: nx, y: ny },
        left_ear: Point2D { x: lx, y: ly },
        right_ear: Point2D { x: rx, y: ry },
        eye_blink_left: input.eye_blink_left,
        eye_blink_right: input.eye_blink_right,
        average_brightness: input.average_brightness,
    };
    let verdict = FrameQualityGate::default().evaluate(&frame);
    assert_eq!(verdict.ok, verdict.reason_code == QualityReason::Ok);
    if verdict.ok {
        assert!(frame.has_face);
    }
});
