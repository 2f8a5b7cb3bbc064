//! Tunable gate thresholds.
//!
//! The yaw bounds are a coarse heuristic that has not been validated
//! against real pose distributions; they are configuration, not invariants.

use serde::{Deserialize, Serialize};

/// Minimum mean luminance `[0,255]` below which a frame is too dark.
pub const DEFAULT_MIN_BRIGHTNESS: f32 = 40.0;

/// Lower bound of the centered region, on both axes.
pub const DEFAULT_CENTER_MIN: f32 = 0.3;

/// Upper bound of the centered region, on both axes.
pub const DEFAULT_CENTER_MAX: f32 = 0.7;

/// Lower bound of the nose-to-ear distance ratio for a forward pose.
pub const DEFAULT_YAW_RATIO_MIN: f32 = 0.3;

/// Upper bound of the nose-to-ear distance ratio for a forward pose.
pub const DEFAULT_YAW_RATIO_MAX: f32 = 0.7;

/// Blink score above which an eye counts as closed.
pub const DEFAULT_MAX_EYE_BLINK: f32 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    #[serde(default = "default_min_brightness")]
    pub min_brightness: f32,
    #[serde(default = "default_center_min")]
    pub center_min: f32,
    #[serde(default = "default_center_max")]
    pub center_max: f32,
    #[serde(default = "default_yaw_ratio_min")]
    pub yaw_ratio_min: f32,
    #[serde(default = "default_yaw_ratio_max")]
    pub yaw_ratio_max: f32,
    #[serde(default = "default_max_eye_blink")]
    pub max_eye_blink: f32,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_min_brightness() -> f32 {
    DEFAULT_MIN_BRIGHTNESS
}

fn default_center_min() -> f32 {
    DEFAULT_CENTER_MIN
}

fn default_center_max() -> f32 {
    DEFAULT_CENTER_MAX
}

fn default_yaw_ratio_min() -> f32 {
    DEFAULT_YAW_RATIO_MIN
}

fn default_yaw_ratio_max() -> f32 {
    DEFAULT_YAW_RATIO_MAX
}

fn default_max_eye_blink() -> f32 {
    DEFAULT_MAX_EYE_BLINK
}

impl QualityThresholds {
    /// Check that every bound is finite and every range is non-empty.
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("min_brightness", self.min_brightness),
            ("center_min", self.center_min),
            ("center_max", self.center_max),
            ("yaw_ratio_min", self.yaw_ratio_min),
            ("yaw_ratio_max", self.yaw_ratio_max),
            ("max_eye_blink", self.max_eye_blink),
        ];
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} must be finite"));
        }
        if self.center_min > self.center_max {
            return Err("center_min must not exceed center_max".into());
        }
        if self.yaw_ratio_min > self.yaw_ratio_max {
            return Err("yaw_ratio_min must not exceed yaw_ratio_max".into());
        }
        Ok(())
    }
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_brightness: DEFAULT_MIN_BRIGHTNESS,
            center_min: DEFAULT_CENTER_MIN,
            center_max: DEFAULT_CENTER_MAX,
            yaw_ratio_min: DEFAULT_YAW_RATIO_MIN,
            yaw_ratio_max: DEFAULT_YAW_RATIO_MAX,
            max_eye_blink: DEFAULT_MAX_EYE_BLINK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let thresholds: QualityThresholds = toml::from_str("min_brightness = 55.0").unwrap();
        assert_eq!(thresholds.min_brightness, 55.0);
        assert_eq!(thresholds.center_min, DEFAULT_CENTER_MIN);
        assert_eq!(thresholds.max_eye_blink, DEFAULT_MAX_EYE_BLINK);
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let thresholds = QualityThresholds {
            center_min: 0.8,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());

        let thresholds = QualityThresholds {
            yaw_ratio_max: f32::NAN,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
        assert!(QualityThresholds::default().validate().is_ok());
    }
}
