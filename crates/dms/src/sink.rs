//! Presentation of rendered frames

use crate::analysis::FrameAnalysis;
use crate::overlay::RenderedFrame;
use crate::DmsError;
use tracing::{debug, enabled, Level};

/// What the loop should do after a frame is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkControl {
    Continue,
    Quit,
}

/// Consumer of rendered frames (a window, a log, a recorder)
pub trait FrameSink {
    fn present(
        &mut self,
        frame: &RenderedFrame,
        analysis: &FrameAnalysis,
    ) -> Result<SinkControl, DmsError>;
}

/// Headless sink: writes each analysis to the debug log
#[derive(Debug, Default)]
pub struct LogSink {
    presented: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FrameSink for LogSink {
    fn present(
        &mut self,
        frame: &RenderedFrame,
        analysis: &FrameAnalysis,
    ) -> Result<SinkControl, DmsError> {
        self.presented += 1;

        if enabled!(Level::DEBUG) {
            let json = serde_json::to_string(analysis)
                .map_err(|e| DmsError::Display(e.to_string()))?;
            debug!(
                face = analysis.face_detected(),
                eyes = analysis.eye_count(),
                banner = ?frame.banner.as_ref().map(|b| &b.message),
                "frame {}", json
            );
        }

        Ok(SinkControl::Continue)
    }
}
