//! Camera Capture Library for the eye-watch monitor
//!
//! Provides frame sources feeding the per-frame detection pipeline.
//! Supports:
//! - Live webcam capture through OpenCV (`opencv` feature)
//! - Replay of an image sequence from a directory
//!
//! Every source is consumed through [`FrameSource`], and [`Frames`] turns a
//! source into a lazy iterator that ends when the camera closes.

pub mod frame;
pub mod sequence;

#[cfg(feature = "opencv")]
pub mod opencv_camera;

pub use frame::VideoFrame;
pub use sequence::ImageSequenceSource;

#[cfg(feature = "opencv")]
pub use opencv_camera::OpenCvCamera;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index (0 is the default webcam)
    pub device: i32,
    /// Requested capture width
    pub width: u32,
    /// Requested capture height
    pub height: u32,
    /// Nominal frame rate, used to timestamp replayed sequences
    pub fps: f64,
    /// Flip frames horizontally before processing
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::day()
    }
}

impl CameraConfig {
    /// Daylight capture: 1280x720, not mirrored
    pub fn day() -> Self {
        Self {
            device: 0,
            width: 1280,
            height: 720,
            fps: 30.0,
            mirror: false,
        }
    }

    /// Low-light capture: 640x480 is faster and more stable in the dark
    pub fn night() -> Self {
        Self {
            device: 0,
            width: 640,
            height: 480,
            fps: 30.0,
            mirror: true,
        }
    }
}

/// A blocking source of video frames.
pub trait FrameSource {
    /// Block until the next frame is available.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Adapt this source into a lazy iterator of frames.
    fn frames(&mut self) -> Frames<'_, Self>
    where
        Self: Sized,
    {
        Frames {
            source: self,
            finished: false,
        }
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        (**self).next_frame()
    }
}

/// Lazy frame sequence, finite until the camera closes.
///
/// A capture error is treated as end of stream: it is logged and the
/// iterator is fused.
pub struct Frames<'a, S: FrameSource> {
    source: &'a mut S,
    finished: bool,
}

impl<S: FrameSource> Iterator for Frames<'_, S> {
    type Item = VideoFrame;

    fn next(&mut self) -> Option<VideoFrame> {
        if self.finished {
            return None;
        }

        match self.source.next_frame() {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                debug!("Frame source reached end of stream");
                self.finished = true;
                None
            }
            Err(e) => {
                warn!("Frame capture failed, ending stream: {}", e);
                self.finished = true;
                None
            }
        }
    }
}

impl<S: FrameSource> std::iter::FusedIterator for Frames<'_, S> {}
