//! Face and eye detection capability

use crate::enhance::EnhancementMode;
use crate::DmsError;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned detection box.
///
/// Coordinates are relative to the frame, or to the parent face region for
/// eye detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Integer center point, used for drawing
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Exact vertical center
    pub fn vertical_center(&self) -> f64 {
        f64::from(self.y) + f64::from(self.height) * 0.5
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Translate a box relative to `parent` into the parent's coordinates
    pub fn offset_by(&self, parent: &BBox) -> BBox {
        BBox::new(parent.x + self.x, parent.y + self.y, self.width, self.height)
    }

    /// Clip to a `width` x `height` image; `None` if nothing remains
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BBox> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clipped = BBox::new(
            self.x,
            self.y,
            self.width.min(width - self.x),
            self.height.min(height - self.y),
        );
        (!clipped.is_empty()).then_some(clipped)
    }
}

/// Multi-scale cascade search parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadeParams {
    /// Image pyramid step between scales (> 1.0)
    pub scale_factor: f64,
    /// Overlapping candidates required to keep a detection
    pub min_neighbors: i32,
    /// Smallest detection side length (pixels)
    pub min_size: u32,
}

/// Face and eye search parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    pub face: CascadeParams,
    pub eye: CascadeParams,
}

impl DetectionParams {
    /// Daylight parameters
    pub fn day() -> Self {
        Self {
            face: CascadeParams {
                scale_factor: 1.1,
                min_neighbors: 5,
                min_size: 100,
            },
            eye: CascadeParams {
                scale_factor: 1.1,
                min_neighbors: 10,
                min_size: 25,
            },
        }
    }

    /// Softer parameters for noisy low-light frames
    pub fn night() -> Self {
        Self {
            face: CascadeParams {
                scale_factor: 1.05,
                min_neighbors: 4,
                min_size: 80,
            },
            eye: CascadeParams {
                scale_factor: 1.05,
                min_neighbors: 8,
                min_size: 18,
            },
        }
    }

    pub fn for_mode(mode: EnhancementMode) -> Self {
        match mode {
            EnhancementMode::Day => Self::day(),
            EnhancementMode::Night => Self::night(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DmsError> {
        for (name, params) in [("face", &self.face), ("eye", &self.eye)] {
            if !(params.scale_factor > 1.0) {
                return Err(DmsError::Config(format!(
                    "{name} scale_factor must be greater than 1.0, got {}",
                    params.scale_factor
                )));
            }
            if params.min_neighbors < 0 {
                return Err(DmsError::Config(format!(
                    "{name} min_neighbors must not be negative"
                )));
            }
        }
        Ok(())
    }
}

/// Bounding-box detector for faces and eyes.
pub trait FaceEyeDetector {
    /// Detect faces in an enhanced grayscale frame
    fn detect_faces(&mut self, frame: &GrayImage) -> Result<Vec<BBox>, DmsError>;

    /// Detect eyes in a face crop; boxes are relative to the crop
    fn detect_eyes(&mut self, face_region: &GrayImage) -> Result<Vec<BBox>, DmsError>;
}
