//! Replay of recorded frames from a directory of images

use crate::{CameraError, FrameSource, VideoFrame};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Frame source that replays image files in name order.
///
/// Timestamps are synthesized from the sequence number and a nominal
/// frame rate, so replays run through the pipeline deterministically.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    frame_interval: Duration,
    mirror: bool,
}

impl ImageSequenceSource {
    /// Collect the images in `dir`.
    pub fn open(dir: impl AsRef<Path>, fps: f64, mirror: bool) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        if !(fps.is_finite() && fps > 0.0) {
            return Err(CameraError::Format(format!("fps must be positive, got {fps}")));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(CameraError::Open(format!(
                "no image files in {}",
                dir.display()
            )));
        }

        info!("Replaying {} frames from {}", paths.len(), dir.display());

        Ok(Self {
            paths,
            next: 0,
            frame_interval: Duration::from_secs_f64(1.0 / fps),
            mirror,
        })
    }

    /// Number of frames in the sequence
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };

        let image = image::open(path)
            .map_err(|source| CameraError::Image {
                path: path.clone(),
                source,
            })?
            .to_rgb8();

        let sequence = self.next as u32;
        self.next += 1;
        debug!("Loaded frame {} from {}", sequence, path.display());

        let mut frame = VideoFrame::new(image, self.frame_interval * sequence, sequence);
        if self.mirror {
            frame.mirror();
        }
        Ok(Some(frame))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use proptest::prelude::*;

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        RgbImage::from_pixel(4, 3, Rgb([shade, shade, shade]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_replays_in_name_order_with_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_002.png", 20);
        write_frame(dir.path(), "frame_001.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 10.0, false).unwrap();
        assert_eq!(source.len(), 2);

        let frames: Vec<VideoFrame> = source.frames().collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].image.get_pixel(0, 0).0[0], 10);
        assert_eq!(frames[1].image.get_pixel(0, 0).0[0], 20);
        assert_eq!(frames[0].timestamp, Duration::ZERO);
        assert_eq!(frames[1].timestamp, Duration::from_millis(100));
        assert_eq!(frames[1].sequence, 1);
    }

    #[test]
    fn test_empty_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let result = ImageSequenceSource::open(dir.path(), 30.0, false);
        assert!(matches!(result, Err(CameraError::Open(_))));
    }

    #[test]
    fn test_rejects_non_positive_fps() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 0);
        assert!(matches!(
            ImageSequenceSource::open(dir.path(), 0.0, false),
            Err(CameraError::Format(_))
        ));
    }

    #[test]
    fn test_unreadable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 30.0, false).unwrap();
        assert!(matches!(source.next_frame(), Err(CameraError::Image { .. })));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_timestamps_follow_frame_rate(count in 1usize..5, fps in 1.0f64..120.0) {
            let dir = tempfile::tempdir().unwrap();
            for i in 0..count {
                write_frame(dir.path(), &format!("frame_{i:03}.png"), i as u8);
            }

            let mut source = ImageSequenceSource::open(dir.path(), fps, false).unwrap();
            let interval = Duration::from_secs_f64(1.0 / fps);
            let frames: Vec<VideoFrame> = source.frames().collect();

            prop_assert_eq!(frames.len(), count);
            for (i, frame) in frames.iter().enumerate() {
                prop_assert_eq!(frame.sequence, i as u32);
                prop_assert_eq!(frame.timestamp, interval * i as u32);
            }
        }
    }
}
