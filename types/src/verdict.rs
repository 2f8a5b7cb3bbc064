//! Frame quality verdicts.
//!
//! A verdict is recomputed every frame and never accumulated. Non-OK
//! reasons are expected, user-correctable states rather than errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hint shown under every non-OK verdict.
pub const QUALITY_HINT: &str = "Ensure good lighting, remove sunglasses/cap, and face forward.";

/// Why a frame passed or failed the quality gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityReason {
    TooDark,
    NoFace,
    OffCenter,
    NotFacingForward,
    EyesClosed,
    Ok,
}

impl QualityReason {
    pub fn message(&self) -> &'static str {
        match self {
            QualityReason::TooDark => "Too dark. Ensure good lighting.",
            QualityReason::NoFace => "No face detected. Remove sunglasses or cap.",
            QualityReason::OffCenter => "Position your face in the center.",
            QualityReason::NotFacingForward => "Look straight at the camera.",
            QualityReason::EyesClosed => "Make sure your eyes are open.",
            QualityReason::Ok => "Perfect! Hold still and capture.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityReason::TooDark => "TOO_DARK",
            QualityReason::NoFace => "NO_FACE",
            QualityReason::OffCenter => "OFF_CENTER",
            QualityReason::NotFacingForward => "NOT_FACING_FORWARD",
            QualityReason::EyesClosed => "EYES_CLOSED",
            QualityReason::Ok => "OK",
        }
    }
}

impl fmt::Display for QualityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail decision for one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityVerdict {
    pub ok: bool,
    pub reason_code: QualityReason,
    pub message: String,
}

impl QualityVerdict {
    /// The verdict for `reason`; it passes exactly when `reason` is `Ok`.
    pub fn from_reason(reason: QualityReason) -> Self {
        Self {
            ok: reason == QualityReason::Ok,
            reason_code: reason,
            message: reason.message().to_string(),
        }
    }

    /// The verdict a session holds before the first frame arrives.
    pub fn pending() -> Self {
        Self {
            ok: false,
            reason_code: QualityReason::NoFace,
            message: "Scanning your face...".to_string(),
        }
    }

    /// Secondary guidance for the user; `None` when the frame passed.
    pub fn hint(&self) -> Option<&'static str> {
        (!self.ok).then_some(QUALITY_HINT)
    }
}
