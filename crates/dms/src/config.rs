//! DMS configuration

use crate::detector::DetectionParams;
use crate::enhance::{EnhancementMode, NightParams};
use crate::filter::DEFAULT_UPPER_RATIO;
use crate::overlay::OverlayStyle;
use crate::DmsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eyes-absent time before the drowsiness alert (seconds)
    pub drowsiness_threshold_secs: f64,

    /// Eyes must be centered above this fraction of the face height
    pub eye_region_ratio: f64,

    /// Scene lighting mode
    pub mode: EnhancementMode,

    /// Low-light enhancement parameters
    pub night: NightParams,

    /// Cascade parameters; defaults to the preset for `mode`
    pub detection: Option<DetectionParams>,

    /// Overlay drawing style
    pub overlay: OverlayStyle,

    /// Draw the warning banner while alerting
    pub show_alert: bool,

    /// Banner text
    pub alert_message: String,

    /// Model paths
    pub face_cascade_path: PathBuf,
    pub eye_cascade_path: PathBuf,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            drowsiness_threshold_secs: 10.0,
            eye_region_ratio: DEFAULT_UPPER_RATIO,
            mode: EnhancementMode::Day,
            night: NightParams::default(),
            detection: None,
            overlay: OverlayStyle::Color,
            show_alert: true,
            alert_message: "WAKE UP!".to_string(),
            face_cascade_path: PathBuf::from(
                "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml",
            ),
            eye_cascade_path: PathBuf::from(
                "/usr/share/opencv4/haarcascades/haarcascade_eye_tree_eyeglasses.xml",
            ),
        }
    }
}

impl DmsConfig {
    /// Drowsiness watch: color frame with the warning banner
    pub fn watch() -> Self {
        Self::default()
    }

    /// Night preview: enhanced grayscale frame with detection boxes only
    pub fn night_preview() -> Self {
        Self {
            mode: EnhancementMode::Night,
            overlay: OverlayStyle::Grayscale,
            show_alert: false,
            ..Default::default()
        }
    }

    /// Alert threshold as a duration
    pub fn threshold(&self) -> Result<Duration, DmsError> {
        Duration::try_from_secs_f64(self.drowsiness_threshold_secs).map_err(|_| {
            DmsError::Config(format!(
                "drowsiness_threshold_secs must be a non-negative number, got {}",
                self.drowsiness_threshold_secs
            ))
        })
    }

    /// Cascade parameters in effect
    pub fn detection_params(&self) -> DetectionParams {
        self.detection
            .unwrap_or_else(|| DetectionParams::for_mode(self.mode))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), DmsError> {
        self.threshold()?;

        if !(self.eye_region_ratio > 0.0 && self.eye_region_ratio <= 1.0) {
            return Err(DmsError::Config(format!(
                "eye_region_ratio must be in (0, 1], got {}",
                self.eye_region_ratio
            )));
        }

        if self.night.clahe_tiles == 0 {
            return Err(DmsError::Config("night.clahe_tiles must be at least 1".into()));
        }
        if !(self.night.denoise_strength >= 0.0) {
            return Err(DmsError::Config(format!(
                "night.denoise_strength must not be negative, got {}",
                self.night.denoise_strength
            )));
        }

        self.detection_params().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DmsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold().unwrap(), Duration::from_secs(10));
        assert_eq!(config.detection_params(), DetectionParams::day());
    }

    #[test]
    fn test_night_preview_preset() {
        let config = DmsConfig::night_preview();
        assert_eq!(config.mode, EnhancementMode::Night);
        assert_eq!(config.overlay, OverlayStyle::Grayscale);
        assert!(!config.show_alert);
        assert_eq!(config.detection_params(), DetectionParams::night());
    }

    #[test]
    fn test_explicit_detection_overrides_mode() {
        let config = DmsConfig {
            mode: EnhancementMode::Night,
            detection: Some(DetectionParams::day()),
            ..Default::default()
        };
        assert_eq!(config.detection_params(), DetectionParams::day());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = DmsConfig {
            drowsiness_threshold_secs: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DmsError::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_eye_ratio() {
        for ratio in [0.0, 1.5, f64::NAN] {
            let config = DmsConfig {
                eye_region_ratio: ratio,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "ratio {ratio} accepted");
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DmsConfig =
            serde_json::from_str(r#"{"drowsiness_threshold_secs": 4.5, "mode": "night"}"#).unwrap();
        assert_eq!(config.threshold().unwrap(), Duration::from_millis(4500));
        assert_eq!(config.mode, EnhancementMode::Night);
        assert_eq!(config.eye_region_ratio, DEFAULT_UPPER_RATIO);
    }
}
