//! Per-frame enhance → detect → filter → monitor pipeline

use crate::analysis::{FaceDetection, FrameAnalysis};
use crate::config::DmsConfig;
use crate::detector::FaceEyeDetector;
use crate::enhance;
use crate::filter::{self, EyePositionFilter};
use crate::monitor::DrowsinessMonitor;
use crate::overlay::{self, RenderedFrame};
use crate::sink::{FrameSink, SinkControl};
use crate::DmsError;
use camera_capture::VideoFrame;
use image::{imageops, GrayImage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub eyes_visible_frames: u64,
    pub alerting_frames: u64,
    pub alerts_raised: u64,
}

/// Drowsiness pipeline over a face/eye detector
pub struct Pipeline<D> {
    config: DmsConfig,
    detector: D,
    filter: EyePositionFilter,
    monitor: DrowsinessMonitor,
    /// Alert state of the previous frame, for transition logging
    was_alerting: bool,
    alerts_raised: u64,
}

impl<D: FaceEyeDetector> Pipeline<D> {
    /// Create a pipeline whose absence timer starts at `started_at`
    pub fn new(config: DmsConfig, detector: D, started_at: Duration) -> Result<Self, DmsError> {
        config.validate()?;
        let threshold = config.threshold()?;

        info!(
            "Creating pipeline: mode={:?}, threshold={:?}, eye_region_ratio={}",
            config.mode, threshold, config.eye_region_ratio
        );

        Ok(Self {
            filter: EyePositionFilter::new(config.eye_region_ratio),
            monitor: DrowsinessMonitor::new(threshold, started_at),
            detector,
            config,
            was_alerting: false,
            alerts_raised: 0,
        })
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn monitor(&self) -> &DrowsinessMonitor {
        &self.monitor
    }

    /// Grayscale conversion and enhancement for the configured mode
    pub fn enhance(&self, frame: &VideoFrame) -> Result<GrayImage, DmsError> {
        enhance::enhance(&frame.to_grayscale(), self.config.mode, &self.config.night)
    }

    /// Enhance and analyze one frame
    pub fn process(&mut self, frame: &VideoFrame) -> Result<FrameAnalysis, DmsError> {
        let enhanced = self.enhance(frame)?;
        self.analyze(frame, &enhanced)
    }

    /// Detect, filter and update the monitor using an already enhanced frame
    pub fn analyze(
        &mut self,
        frame: &VideoFrame,
        enhanced: &GrayImage,
    ) -> Result<FrameAnalysis, DmsError> {
        let (width, height) = enhanced.dimensions();
        let candidates = self.detector.detect_faces(enhanced)?;

        let mut faces = Vec::with_capacity(candidates.len());
        for detected in candidates {
            let Some(face) = detected.clamp_to(width, height) else {
                debug!("Dropping face outside the frame: {:?}", detected);
                continue;
            };

            // Clipping keeps the origin, so eye boxes in the crop are also
            // relative to the detected face; its full height sets the cutoff.
            let region = imageops::crop_imm(enhanced, face.x, face.y, face.width, face.height).to_image();
            let eyes = self.detector.detect_eyes(&region)?;
            let found = eyes.len();
            let eyes = self.filter.apply(eyes, detected.height);
            debug!("Face {:?}: {} eye candidates, {} accepted", face, found, eyes.len());

            faces.push(FaceDetection { face, eyes });
        }

        let now = frame.timestamp;
        let eyes_visible = filter::eyes_visible(&faces);
        self.monitor.record_frame(eyes_visible, now);
        let alerting = self.monitor.is_alerting(now);
        let since_last_seen = self.monitor.since_last_seen(now);
        self.track_transition(alerting, since_last_seen);

        Ok(FrameAnalysis {
            sequence: frame.sequence,
            timestamp: now,
            faces,
            eyes_visible,
            since_last_seen,
            alerting,
        })
    }

    /// Draw the configured overlay for an analyzed frame
    pub fn render(
        &self,
        frame: &VideoFrame,
        enhanced: &GrayImage,
        analysis: &FrameAnalysis,
    ) -> RenderedFrame {
        let banner = self
            .config
            .show_alert
            .then_some(self.config.alert_message.as_str());
        overlay::render(frame, enhanced, analysis, self.config.overlay, banner)
    }

    /// Process frames until the stream ends, the sink quits, or `stop` is set.
    ///
    /// `stop` is checked before each frame is pulled from `frames`, so a
    /// blocking camera read never delays shutdown by a frame.
    pub fn run<I, S>(
        &mut self,
        frames: I,
        sink: &mut S,
        stop: &AtomicBool,
    ) -> Result<RunSummary, DmsError>
    where
        I: IntoIterator<Item = VideoFrame>,
        S: FrameSink + ?Sized,
    {
        let raised_before = self.alerts_raised;
        let mut summary = RunSummary::default();
        let mut frames = frames.into_iter();

        loop {
            if stop.load(Ordering::Relaxed) {
                info!("Exit signal received");
                break;
            }
            let Some(frame) = frames.next() else {
                break;
            };

            let enhanced = self.enhance(&frame)?;
            let analysis = self.analyze(&frame, &enhanced)?;

            summary.frames += 1;
            summary.eyes_visible_frames += u64::from(analysis.eyes_visible);
            summary.alerting_frames += u64::from(analysis.alerting);

            let rendered = self.render(&frame, &enhanced, &analysis);
            if sink.present(&rendered, &analysis)? == SinkControl::Quit {
                info!("Exit requested by user");
                break;
            }
        }

        summary.alerts_raised = self.alerts_raised - raised_before;
        info!(
            "Run finished: {} frames, {} with eyes, {} alerting, {} alerts raised",
            summary.frames, summary.eyes_visible_frames, summary.alerting_frames, summary.alerts_raised
        );
        Ok(summary)
    }

    fn track_transition(&mut self, alerting: bool, since_last_seen: Duration) {
        match (self.was_alerting, alerting) {
            (false, true) => {
                self.alerts_raised += 1;
                warn!("Drowsiness alert: no eyes seen for {:.1}s", since_last_seen.as_secs_f64());
            }
            (true, false) => info!("Drowsiness alert cleared: eyes visible again"),
            _ => {}
        }
        self.was_alerting = alerting;
    }
}
