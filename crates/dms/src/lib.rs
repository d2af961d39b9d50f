//! Driver Monitoring System (DMS)
//!
//! Drowsiness warning driven by face/eye detections:
//! - Grayscale enhancement for day and night scenes
//! - Face and eye detection behind [`FaceEyeDetector`]
//! - Eye-position filtering within each face region
//! - Absence timer that raises an alert once eyes go unseen too long
//! - Overlay rendering and presentation sinks

pub mod analysis;
pub mod config;
pub mod detector;
pub mod enhance;
pub mod filter;
pub mod monitor;
pub mod overlay;
pub mod pipeline;
pub mod sink;

#[cfg(feature = "opencv")]
pub mod cascade;
#[cfg(feature = "opencv")]
mod mat;
#[cfg(feature = "opencv")]
pub mod window;

pub use analysis::{FaceDetection, FrameAnalysis};
pub use config::DmsConfig;
pub use detector::{BBox, CascadeParams, DetectionParams, FaceEyeDetector};
pub use enhance::{EnhancementMode, NightParams};
pub use filter::EyePositionFilter;
pub use monitor::DrowsinessMonitor;
pub use overlay::{Banner, OverlayStyle, RenderedFrame};
pub use pipeline::{Pipeline, RunSummary};
pub use sink::{FrameSink, LogSink, SinkControl};

#[cfg(feature = "opencv")]
pub use cascade::CascadeDetector;
#[cfg(feature = "opencv")]
pub use window::HighguiWindow;

use camera_capture::CameraError;
use thiserror::Error;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Display failed: {0}")]
    Display(String),

    #[error(transparent)]
    Camera(#[from] CameraError),
}
