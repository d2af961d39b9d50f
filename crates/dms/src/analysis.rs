//! DMS per-frame analysis results

use crate::detector::BBox;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A detected face and the eyes accepted within it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Face box in frame coordinates
    pub face: BBox,

    /// Accepted eye boxes, relative to the face
    pub eyes: Vec<BBox>,
}

impl FaceDetection {
    /// Accepted eye boxes in frame coordinates
    pub fn eyes_in_frame(&self) -> impl Iterator<Item = BBox> + '_ {
        self.eyes.iter().map(move |eye| eye.offset_by(&self.face))
    }
}

/// Complete analysis of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Frame sequence number
    pub sequence: u32,

    /// Frame timestamp (offset from stream start)
    pub timestamp: Duration,

    /// Detected faces with their accepted eyes
    pub faces: Vec<FaceDetection>,

    /// Whether any face yielded an accepted eye
    pub eyes_visible: bool,

    /// Time since eyes were last seen, as of this frame
    pub since_last_seen: Duration,

    /// Eyes absent for at least the configured threshold
    pub alerting: bool,
}

impl FrameAnalysis {
    pub fn face_detected(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Total accepted eyes across all faces
    pub fn eye_count(&self) -> usize {
        self.faces.iter().map(|f| f.eyes.len()).sum()
    }
}
