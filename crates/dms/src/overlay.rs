//! Detection overlays and the warning banner

use crate::analysis::FrameAnalysis;
use crate::detector::BBox;
use camera_capture::VideoFrame;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, Canvas};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

const BOX_THICKNESS: u32 = 2;
const EYE_DOT_RADIUS: i32 = 2;

/// Banner bar height as a fraction of the frame height
const BANNER_HEIGHT_RATIO: f64 = 0.12;
const TEXT_X_RATIO: f64 = 0.05;
const TEXT_BASELINE_RATIO: f64 = 0.09;

/// How detections are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStyle {
    /// White boxes on the enhanced grayscale frame
    Grayscale,
    /// Colored boxes on the original frame
    #[default]
    Color,
}

/// Warning banner placement; the sink renders the text itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    /// Black bar behind the text
    pub bar: BBox,
    /// Bottom-left corner of the text
    pub text_origin: (i32, i32),
}

impl Banner {
    /// Lay out a banner for a `width` x `height` frame
    pub fn layout(message: &str, width: u32, height: u32) -> Self {
        let bar_height = ((BANNER_HEIGHT_RATIO * f64::from(height)) as u32).max(1);
        Self {
            message: message.to_string(),
            bar: BBox::new(0, 0, width, bar_height.min(height)),
            text_origin: (
                (TEXT_X_RATIO * f64::from(width)) as i32,
                (TEXT_BASELINE_RATIO * f64::from(height)) as i32,
            ),
        }
    }
}

/// A frame ready for presentation
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub image: RgbImage,
    pub banner: Option<Banner>,
}

/// Draw detections onto the frame in the given style.
///
/// `enhanced` is the grayscale image detection ran on; it is the canvas
/// for the grayscale style.
pub fn render(
    frame: &VideoFrame,
    enhanced: &GrayImage,
    analysis: &FrameAnalysis,
    style: OverlayStyle,
    banner_message: Option<&str>,
) -> RenderedFrame {
    let mut image = match style {
        OverlayStyle::Grayscale => {
            let mut canvas = enhanced.clone();
            let white = Luma([255u8]);
            draw_detections(&mut canvas, analysis, white, white, white);
            DynamicImage::ImageLuma8(canvas).to_rgb8()
        }
        OverlayStyle::Color => {
            let mut canvas = frame.image.clone();
            draw_detections(
                &mut canvas,
                analysis,
                Rgb([0, 255, 0]),
                Rgb([0, 0, 255]),
                Rgb([255, 0, 0]),
            );
            canvas
        }
    };

    let banner = match banner_message {
        Some(message) if analysis.alerting => {
            let banner = Banner::layout(message, image.width(), image.height());
            if let Some(rect) = to_rect(&banner.bar) {
                draw_filled_rect_mut(&mut image, rect, Rgb([0, 0, 0]));
            }
            Some(banner)
        }
        _ => None,
    };

    RenderedFrame { image, banner }
}

fn draw_detections<C: Canvas>(
    canvas: &mut C,
    analysis: &FrameAnalysis,
    face_color: C::Pixel,
    eye_color: C::Pixel,
    dot_color: C::Pixel,
) {
    for detection in &analysis.faces {
        draw_box(canvas, &detection.face, face_color);

        for eye in detection.eyes_in_frame() {
            draw_box(canvas, &eye, eye_color);
            let (cx, cy) = eye.center();
            draw_filled_circle_mut(canvas, (cx as i32, cy as i32), EYE_DOT_RADIUS, dot_color);
        }
    }
}

fn draw_box<C: Canvas>(canvas: &mut C, bbox: &BBox, color: C::Pixel) {
    for inset in 0..BOX_THICKNESS {
        if bbox.width <= 2 * inset || bbox.height <= 2 * inset {
            break;
        }
        let inner = BBox::new(
            bbox.x + inset,
            bbox.y + inset,
            bbox.width - 2 * inset,
            bbox.height - 2 * inset,
        );
        if let Some(rect) = to_rect(&inner) {
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }
}

fn to_rect(bbox: &BBox) -> Option<Rect> {
    (!bbox.is_empty()).then(|| Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height))
}
