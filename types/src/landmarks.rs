//! Per-frame face landmark snapshot.

use serde::{Deserialize, Serialize};

/// A point in normalized frame coordinates, `[0,1]` on both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The landmark data the quality gate judges, one per rendered frame.
///
/// When `has_face` is false the geometry and blink fields are meaningless
/// and left at their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceLandmarkFrame {
    pub has_face: bool,
    #[serde(default)]
    pub nose: Point2D,
    #[serde(default)]
    pub left_ear: Point2D,
    #[serde(default)]
    pub right_ear: Point2D,
    /// Blend-shape confidence that the left eye is closed, `[0,1]`.
    #[serde(default)]
    pub eye_blink_left: f32,
    /// Blend-shape confidence that the right eye is closed, `[0,1]`.
    #[serde(default)]
    pub eye_blink_right: f32,
    /// Mean pixel luminance of the frame, `[0,255]`.
    pub average_brightness: f32,
}

impl FaceLandmarkFrame {
    /// The "no landmarks" sentinel: the model found no face in this frame.
    pub fn no_face(average_brightness: f32) -> Self {
        Self {
            has_face: false,
            nose: Point2D::default(),
            left_ear: Point2D::default(),
            right_ear: Point2D::default(),
            eye_blink_left: 0.0,
            eye_blink_right: 0.0,
            average_brightness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_face_frame_from_json_needs_only_presence_and_brightness() {
        let frame: FaceLandmarkFrame =
            serde_json::from_str(r#"{"hasFace": false, "averageBrightness": 120.0}"#).unwrap();
        assert_eq!(frame, FaceLandmarkFrame::no_face(120.0));
    }

    #[test]
    fn camel_case_fields() {
        let json = r#"{
            "hasFace": true,
            "nose": {"x": 0.5, "y": 0.5},
            "leftEar": {"x": 0.3, "y": 0.5},
            "rightEar": {"x": 0.7, "y": 0.5},
            "eyeBlinkLeft": 0.1,
            "eyeBlinkRight": 0.2,
            "averageBrightness": 90.0
        }"#;
        let frame: FaceLandmarkFrame = serde_json::from_str(json).unwrap();
        assert!(frame.has_face);
        assert_eq!(frame.right_ear, Point2D::new(0.7, 0.5));
        assert!((frame.eye_blink_right - 0.2).abs() < f32::EPSILON);
    }
}
