//! Video frame types and processing

use image::{imageops, GrayImage, RgbImage};
use std::time::Duration;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixels
    pub image: RgbImage,
    /// Capture time, relative to the start of the stream
    pub timestamp: Duration,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from an RGB image
    pub fn new(image: RgbImage, timestamp: Duration, sequence: u32) -> Self {
        Self {
            image,
            timestamp,
            sequence,
        }
    }

    /// Frame width
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Convert to grayscale luma
    pub fn to_grayscale(&self) -> GrayImage {
        imageops::grayscale(&self.image)
    }

    /// Flip the frame horizontally in place
    pub fn mirror(&mut self) {
        imageops::flip_horizontal_in_place(&mut self.image);
    }
}
