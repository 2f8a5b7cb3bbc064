//! The per-frame gate.

use facegate_types::{FaceLandmarkFrame, QualityReason, QualityVerdict};
use tracing::trace;

use crate::thresholds::QualityThresholds;

/// Judges one landmark frame at a time.
#[derive(Clone, Debug, Default)]
pub struct FrameQualityGate {
    thresholds: QualityThresholds,
}

impl FrameQualityGate {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    /// Evaluate a frame. Pure and deterministic.
    pub fn evaluate(&self, frame: &FaceLandmarkFrame) -> QualityVerdict {
        let reason = self.first_failure(frame).unwrap_or(QualityReason::Ok);
        trace!(%reason, "frame evaluated");
        QualityVerdict::from_reason(reason)
    }

    fn first_failure(&self, frame: &FaceLandmarkFrame) -> Option<QualityReason> {
        let t = &self.thresholds;

        // NaN brightness reads as too dark.
        if !(frame.average_brightness >= t.min_brightness) {
            return Some(QualityReason::TooDark);
        }

        if !frame.has_face {
            return Some(QualityReason::NoFace);
        }

        let nose = frame.nose;
        if !within(nose.x, t.center_min, t.center_max) || !within(nose.y, t.center_min, t.center_max)
        {
            return Some(QualityReason::OffCenter);
        }

        match yaw_ratio(frame) {
            Some(ratio) if within(ratio, t.yaw_ratio_min, t.yaw_ratio_max) => {}
            _ => return Some(QualityReason::NotFacingForward),
        }

        if !(frame.eye_blink_left <= t.max_eye_blink) || !(frame.eye_blink_right <= t.max_eye_blink)
        {
            return Some(QualityReason::EyesClosed);
        }

        None
    }
}

/// Horizontal nose-to-left-ear distance as a share of both ear distances.
///
/// 0.5 means the nose sits midway between the ears. `None` when the ratio
/// is undefined (nose and both ears share one x coordinate).
pub fn yaw_ratio(frame: &FaceLandmarkFrame) -> Option<f32> {
    let d_left = (frame.nose.x - frame.left_ear.x).abs();
    let d_right = (frame.nose.x - frame.right_ear.x).abs();
    let total = d_left + d_right;
    (total > 0.0).then(|| d_left / total)
}

fn within(value: f32, min: f32, max: f32) -> bool {
    value >= min && value <= max
}
