//! Webcam capture through OpenCV's videoio module

use crate::{CameraConfig, CameraError, FrameSource, VideoFrame};
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::time::Instant;
use tracing::{info, warn};

/// Live webcam frame source
pub struct OpenCvCamera {
    capture: VideoCapture,
    started_at: Instant,
    sequence: u32,
    mirror: bool,
}

impl OpenCvCamera {
    /// Open the configured device and request its resolution.
    ///
    /// Fails if the device can't be opened; the driver may ignore the
    /// requested resolution, which is only logged.
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        info!("Opening camera {}", config.device);
        let mut capture = VideoCapture::new(config.device, videoio::CAP_ANY).map_err(cv_open)?;

        if !capture.is_opened().map_err(cv_open)? {
            return Err(CameraError::Open(format!(
                "camera {} is not available",
                config.device
            )));
        }

        capture
            .set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(config.width))
            .map_err(cv_open)?;
        capture
            .set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(config.height))
            .map_err(cv_open)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
        if actual_width as u32 != config.width || actual_height as u32 != config.height {
            warn!(
                "Camera ignored requested {}x{}, capturing at {}x{}",
                config.width, config.height, actual_width, actual_height
            );
        }

        Ok(Self {
            capture,
            started_at: Instant::now(),
            sequence: 0,
            mirror: config.mirror,
        })
    }
}

impl FrameSource for OpenCvCamera {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let mut bgr = Mat::default();
        let grabbed = self.capture.read(&mut bgr).map_err(cv_capture)?;
        if !grabbed || bgr.empty() {
            return Ok(None);
        }
        let timestamp = self.started_at.elapsed();

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB).map_err(cv_capture)?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb.data_bytes().map_err(cv_capture)?.to_vec();
        let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            CameraError::Format(format!("unexpected buffer size for {width}x{height} frame"))
        })?;

        let mut frame = VideoFrame::new(image, timestamp, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        if self.mirror {
            frame.mirror();
        }
        Ok(Some(frame))
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release camera: {}", e);
        }
    }
}

fn cv_open(e: opencv::Error) -> CameraError {
    CameraError::Open(e.to_string())
}

fn cv_capture(e: opencv::Error) -> CameraError {
    CameraError::Capture(e.to_string())
}
