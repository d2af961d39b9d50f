//! On-screen preview window (OpenCV HighGUI)

use crate::analysis::FrameAnalysis;
use crate::overlay::RenderedFrame;
use crate::sink::{FrameSink, SinkControl};
use crate::DmsError;
use opencv::{
    core::{Mat, Point, Scalar, CV_8UC3},
    highgui, imgproc,
    prelude::*,
};
use tracing::{info, warn};

const KEY_ESC: i32 = 27;

/// Preview window; `q` or ESC requests exit
pub struct HighguiWindow {
    title: String,
}

impl HighguiWindow {
    pub fn open(title: &str) -> Result<Self, DmsError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(display_err)?;
        info!("Opened preview window '{}'", title);
        Ok(Self {
            title: title.to_string(),
        })
    }
}

impl FrameSink for HighguiWindow {
    fn present(
        &mut self,
        frame: &RenderedFrame,
        _analysis: &FrameAnalysis,
    ) -> Result<SinkControl, DmsError> {
        let mut bgr = rgb_to_bgr_mat(&frame.image)?;

        if let Some(banner) = &frame.banner {
            let (x, y) = banner.text_origin;
            imgproc::put_text(
                &mut bgr,
                &banner.message,
                Point::new(x, y),
                imgproc::FONT_HERSHEY_SIMPLEX,
                2.0,
                Scalar::new(0.0, 0.0, 255.0, 0.0),
                4,
                imgproc::LINE_AA,
                false,
            )
            .map_err(display_err)?;
        }

        highgui::imshow(&self.title, &bgr).map_err(display_err)?;

        let key = highgui::wait_key(1).map_err(display_err)? & 0xFF;
        if key == i32::from(b'q') || key == KEY_ESC {
            return Ok(SinkControl::Quit);
        }
        Ok(SinkControl::Continue)
    }
}

impl Drop for HighguiWindow {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.title) {
            warn!("Failed to close window '{}': {}", self.title, e);
        }
    }
}

fn rgb_to_bgr_mat(image: &image::RgbImage) -> Result<Mat, DmsError> {
    let mut rgb = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )
    .map_err(display_err)?;
    rgb.data_bytes_mut()
        .map_err(display_err)?
        .copy_from_slice(image.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR).map_err(display_err)?;
    Ok(bgr)
}

fn display_err(e: opencv::Error) -> DmsError {
    DmsError::Display(e.to_string())
}
