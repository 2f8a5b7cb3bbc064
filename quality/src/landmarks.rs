//! Extraction of the gate's inputs from a full face-mesh result.
//!
//! The landmark model returns a 478-point mesh per face plus named
//! blend-shape scores. The gate only needs three mesh points and two
//! scores.

use facegate_types::{FaceLandmarkFrame, Point2D};

/// Mesh index of the nose tip.
pub const NOSE_TIP_INDEX: usize = 1;

/// Mesh index of the left ear (tragion).
pub const LEFT_EAR_INDEX: usize = 234;

/// Mesh index of the right ear (tragion).
pub const RIGHT_EAR_INDEX: usize = 454;

const EYE_BLINK_LEFT: &str = "eyeBlinkLeft";
const EYE_BLINK_RIGHT: &str = "eyeBlinkRight";

/// One named blend-shape score as reported by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendshapeScore {
    pub category_name: String,
    pub score: f32,
}

impl BlendshapeScore {
    pub fn new(category_name: impl Into<String>, score: f32) -> Self {
        Self {
            category_name: category_name.into(),
            score,
        }
    }
}

/// Build a gate frame from the first detected face.
///
/// `faces` holds one mesh per detected face; only the first is used. An
/// empty list, or a mesh too short to contain the ear landmarks, yields the
/// no-face sentinel. Missing blink categories read as fully open eyes.
pub fn frame_from_mesh(
    faces: &[Vec<Point2D>],
    blendshapes: &[BlendshapeScore],
    average_brightness: f32,
) -> FaceLandmarkFrame {
    let Some(mesh) = faces.first() else {
        return FaceLandmarkFrame::no_face(average_brightness);
    };
    let (Some(nose), Some(left_ear), Some(right_ear)) = (
        mesh.get(NOSE_TIP_INDEX),
        mesh.get(LEFT_EAR_INDEX),
        mesh.get(RIGHT_EAR_INDEX),
    ) else {
        return FaceLandmarkFrame::no_face(average_brightness);
    };

    FaceLandmarkFrame {
        has_face: true,
        nose: *nose,
        left_ear: *left_ear,
        right_ear: *right_ear,
        eye_blink_left: score_of(blendshapes, EYE_BLINK_LEFT),
        eye_blink_right: score_of(blendshapes, EYE_BLINK_RIGHT),
        average_brightness,
    }
}

fn score_of(blendshapes: &[BlendshapeScore], name: &str) -> f32 {
    blendshapes
        .iter()
        .find(|b| b.category_name == name)
        .map(|b| b.score)
        .unwrap_or(0.0)
}
