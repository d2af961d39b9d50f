//! Haar-cascade face/eye detector backed by OpenCV's objdetect module

use crate::detector::{BBox, CascadeParams, DetectionParams, FaceEyeDetector};
use crate::mat::gray_to_mat;
use crate::DmsError;
use image::GrayImage;
use opencv::{
    core::{Rect, Size, Vector},
    objdetect::CascadeClassifier,
    prelude::*,
};
use std::path::Path;
use tracing::{error, info};

/// Face and eye detector using two pre-trained cascade classifiers
pub struct CascadeDetector {
    face: CascadeClassifier,
    eye: CascadeClassifier,
    params: DetectionParams,
}

impl CascadeDetector {
    /// Load both classifiers. Missing or unreadable model files are fatal.
    pub fn load(
        face_path: &Path,
        eye_path: &Path,
        params: DetectionParams,
    ) -> Result<Self, DmsError> {
        let face = load_classifier("face", face_path)?;
        let eye = load_classifier("eye", eye_path)?;
        Ok(Self { face, eye, params })
    }

    fn detect(
        classifier: &mut CascadeClassifier,
        image: &GrayImage,
        params: &CascadeParams,
    ) -> Result<Vec<BBox>, DmsError> {
        let mat = gray_to_mat(image)?;
        let min_size = params.min_size as i32;
        let mut found = Vector::<Rect>::new();

        classifier
            .detect_multi_scale(
                &mat,
                &mut found,
                params.scale_factor,
                params.min_neighbors,
                0,
                Size::new(min_size, min_size),
                Size::default(),
            )
            .map_err(|e| DmsError::Detection(e.to_string()))?;

        Ok(found.iter().map(to_bbox).collect())
    }
}

impl FaceEyeDetector for CascadeDetector {
    fn detect_faces(&mut self, frame: &GrayImage) -> Result<Vec<BBox>, DmsError> {
        Self::detect(&mut self.face, frame, &self.params.face)
    }

    fn detect_eyes(&mut self, face_region: &GrayImage) -> Result<Vec<BBox>, DmsError> {
        Self::detect(&mut self.eye, face_region, &self.params.eye)
    }
}

fn load_classifier(kind: &str, path: &Path) -> Result<CascadeClassifier, DmsError> {
    if !path.is_file() {
        error!("{} cascade not found at {}", kind, path.display());
        return Err(DmsError::ModelLoad(format!(
            "{kind} cascade not found: {}",
            path.display()
        )));
    }

    info!("Loading {} cascade from {}", kind, path.display());
    let path_str = path
        .to_str()
        .ok_or_else(|| DmsError::ModelLoad(format!("non UTF-8 path: {}", path.display())))?;

    let classifier =
        CascadeClassifier::new(path_str).map_err(|e| DmsError::ModelLoad(e.to_string()))?;
    if classifier.empty().map_err(|e| DmsError::ModelLoad(e.to_string()))? {
        return Err(DmsError::ModelLoad(format!(
            "{kind} cascade is empty or invalid: {}",
            path.display()
        )));
    }
    Ok(classifier)
}

fn to_bbox(rect: Rect) -> BBox {
    let x = rect.x.max(0);
    let y = rect.y.max(0);
    BBox::new(
        x as u32,
        y as u32,
        (rect.width - (x - rect.x)).max(0) as u32,
        (rect.height - (y - rect.y)).max(0) as u32,
    )
}
