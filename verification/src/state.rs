//! Session state.
//!
//! The state is a tagged enum whose variants own exactly the data that is
//! valid in them: an image exists only once captured, and a submission
//! attempt id only while submitting. "Submit without capture" cannot be
//! represented.

use facegate_types::{FlowResult, ImageBlob};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Entered with a token, waiting for the user to begin.
    Intro,
    /// Entered without a token. Terminal.
    NoToken,
    /// Live preview; frames are being judged.
    CameraActive,
    /// A still has been captured and awaits submit or retake.
    Review { image: ImageBlob },
    /// Backend submission in flight for `attempt`.
    Submitting { image: ImageBlob, attempt: u64 },
    /// Submission succeeded. Terminal.
    Success,
    /// Token re-validation or submission failed. The image is kept so the
    /// user can resubmit.
    Failed { image: ImageBlob },
    /// The user left the flow. Terminal; the final result is frozen.
    Closed { final_result: Option<FlowResult> },
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Intro => SessionPhase::Intro,
            SessionState::NoToken => SessionPhase::NoToken,
            SessionState::CameraActive => SessionPhase::CameraActive,
            SessionState::Review { .. } => SessionPhase::Review,
            SessionState::Submitting { .. } => SessionPhase::Submitting,
            SessionState::Success => SessionPhase::Success,
            SessionState::Failed { .. } => SessionPhase::Failed,
            SessionState::Closed { .. } => SessionPhase::Closed,
        }
    }

    pub fn captured_image(&self) -> Option<&ImageBlob> {
        match self {
            SessionState::Review { image }
            | SessionState::Submitting { image, .. }
            | SessionState::Failed { image } => Some(image),
            _ => None,
        }
    }
}

/// Data-free view of [`SessionState`] for logging and reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Intro,
    NoToken,
    CameraActive,
    Review,
    Submitting,
    Success,
    Failed,
    Closed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Intro => "INTRO",
            SessionPhase::NoToken => "NO_TOKEN",
            SessionPhase::CameraActive => "CAMERA_ACTIVE",
            SessionPhase::Review => "REVIEW",
            SessionPhase::Submitting => "SUBMITTING",
            SessionPhase::Success => "SUCCESS",
            SessionPhase::Failed => "FAILED",
            SessionPhase::Closed => "CLOSED",
        }
    }

    /// No further transition leads anywhere but `Closed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::NoToken | SessionPhase::Success | SessionPhase::Closed
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
