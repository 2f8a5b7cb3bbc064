//! Frame quality gate.
//!
//! Decides, per video frame, whether the current image is acceptable to
//! capture. Each frame is judged on its own: no state is carried between
//! calls, so there is no hysteresis or debouncing.
//!
//! Checks run cheapest first and the first failure wins:
//! illumination, presence, centering, facing-forward, eyes open.

pub mod brightness;
pub mod gate;
pub mod landmarks;
pub mod thresholds;

pub use brightness::average_brightness_rgba;
pub use gate::{yaw_ratio, FrameQualityGate};
pub use landmarks::{
    frame_from_mesh, BlendshapeScore, LEFT_EAR_INDEX, NOSE_TIP_INDEX, RIGHT_EAR_INDEX,
};
pub use thresholds::QualityThresholds;
