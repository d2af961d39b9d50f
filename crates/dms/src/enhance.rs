//! Grayscale enhancement ahead of detection
//!
//! Day frames get a global histogram equalization. Night frames are
//! denoised, locally equalized (CLAHE) and then brightened with a linear
//! gain and bias. The night parameters are tuned by eye and are only
//! defaults.
//!
//! With the `opencv` feature the night chain runs on OpenCV's
//! non-local-means denoiser and CLAHE. Without it, a median filter and the
//! CLAHE in this module stand in.

use crate::DmsError;
use image::{GrayImage, Luma};
use imageproc::contrast::equalize_histogram;
use serde::{Deserialize, Serialize};

/// Scene lighting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementMode {
    #[default]
    Day,
    Night,
}

/// Low-light enhancement parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightParams {
    /// Non-local-means filter strength; 0 disables denoising
    pub denoise_strength: f32,
    /// Median filter radius used when built without OpenCV
    pub denoise_radius: u32,
    /// CLAHE clip limit, relative to a uniform histogram
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid size (tiles per side)
    pub clahe_tiles: u32,
    /// Linear gain applied after CLAHE
    pub gain: f32,
    /// Bias added after the gain
    pub bias: f32,
}

impl Default for NightParams {
    fn default() -> Self {
        Self {
            denoise_strength: 6.0,
            denoise_radius: 1,
            clahe_clip_limit: 2.5,
            clahe_tiles: 8,
            gain: 1.2,
            bias: 8.0,
        }
    }
}

/// Enhance a grayscale frame for the given mode
pub fn enhance(
    gray: &GrayImage,
    mode: EnhancementMode,
    night: &NightParams,
) -> Result<GrayImage, DmsError> {
    match mode {
        EnhancementMode::Day => Ok(equalize_histogram(gray)),
        EnhancementMode::Night => enhance_night(gray, night),
    }
}

#[cfg(feature = "opencv")]
fn enhance_night(gray: &GrayImage, night: &NightParams) -> Result<GrayImage, DmsError> {
    use crate::mat::{cv_err, gray_to_mat, mat_to_gray};
    use opencv::{
        core::{self, Mat, Size},
        imgproc, photo,
        prelude::*,
    };

    const TEMPLATE_WINDOW: i32 = 7;
    const SEARCH_WINDOW: i32 = 21;

    if gray.width() == 0 || gray.height() == 0 {
        return Ok(gray.clone());
    }

    let src = gray_to_mat(gray)?;
    let denoised = if night.denoise_strength > 0.0 {
        let mut out = Mat::default();
        photo::fast_nl_means_denoising(
            &src,
            &mut out,
            night.denoise_strength,
            TEMPLATE_WINDOW,
            SEARCH_WINDOW,
        )
        .map_err(cv_err)?;
        out
    } else {
        src
    };

    let tiles = night.clahe_tiles.max(1) as i32;
    let mut clahe = imgproc::create_clahe(f64::from(night.clahe_clip_limit), Size::new(tiles, tiles))
        .map_err(cv_err)?;
    let mut equalized = Mat::default();
    clahe.apply(&denoised, &mut equalized).map_err(cv_err)?;

    let mut scaled = Mat::default();
    core::convert_scale_abs(
        &equalized,
        &mut scaled,
        f64::from(night.gain),
        f64::from(night.bias),
    )
    .map_err(cv_err)?;

    mat_to_gray(&scaled)
}

#[cfg(not(feature = "opencv"))]
fn enhance_night(gray: &GrayImage, night: &NightParams) -> Result<GrayImage, DmsError> {
    use imageproc::filter::median_filter;

    let denoised = if night.denoise_strength > 0.0 && night.denoise_radius > 0 {
        median_filter(gray, night.denoise_radius, night.denoise_radius)
    } else {
        gray.clone()
    };
    let equalized = clahe(&denoised, night.clahe_clip_limit, night.clahe_tiles);
    Ok(scale_abs(&equalized, night.gain, night.bias))
}

/// `saturate(|alpha * p + beta|)` per pixel
pub fn scale_abs(image: &GrayImage, alpha: f32, beta: f32) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let value = (alpha * f32::from(pixel.0[0]) + beta).abs().round();
        pixel.0[0] = value.min(255.0) as u8;
    }
    out
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into at most `tiles` x `tiles` regions. Each region's
/// histogram is clipped at `clip_limit` times the uniform bin height, the
/// excess is spread over all bins, and the resulting mappings are blended
/// bilinearly between neighboring tile centers.
pub fn clahe(image: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tiles = tiles.max(1);
    let tile_w = width.div_ceil(tiles.min(width));
    let tile_h = height.div_ceil(tiles.min(height));
    let tiles_x = width.div_ceil(tile_w) as usize;
    let tiles_y = height.div_ceil(tile_h) as usize;

    let mut luts = Vec::with_capacity(tiles_x * tiles_y);
    for ty in 0..tiles_y as u32 {
        for tx in 0..tiles_x as u32 {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, (x0, y0, x1, y1), clip_limit));
        }
    }

    let lut = |tx: usize, ty: usize| &luts[ty * tiles_x + tx];
    let neighbors = |pos: u32, size: u32, count: usize| -> (usize, usize, f32) {
        let f = (pos as f32 + 0.5) / size as f32 - 0.5;
        let lo = f.floor();
        let weight = f - lo;
        let last = count as i64 - 1;
        let i0 = (lo as i64).clamp(0, last) as usize;
        let i1 = (lo as i64 + 1).clamp(0, last) as usize;
        (i0, i1, weight)
    };

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let (ty0, ty1, wy) = neighbors(y, tile_h, tiles_y);
        for x in 0..width {
            let (tx0, tx1, wx) = neighbors(x, tile_w, tiles_x);
            let p = image.get_pixel(x, y).0[0] as usize;

            let top = (1.0 - wx) * lut(tx0, ty0)[p] + wx * lut(tx1, ty0)[p];
            let bottom = (1.0 - wx) * lut(tx0, ty1)[p] + wx * lut(tx1, ty1)[p];
            let value = (1.0 - wy) * top + wy * bottom;

            out.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Clipped-histogram equalization mapping for one tile
fn tile_lut(image: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [f32; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[image.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    let area = (x1 - x0) * (y1 - y0);
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let per_bin = excess / 256;
    let residual = excess % 256;
    for bin in hist.iter_mut() {
        *bin += per_bin;
    }
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        for bin in hist.iter_mut().step_by(step).take(residual as usize) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0f32; 256];
    let mut cdf = 0;
    for (value, count) in hist.iter().enumerate() {
        cdf += count;
        lut[value] = cdf as f32 * scale;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(image: &GrayImage) -> u8 {
        let values = image.pixels().map(|p| p.0[0]);
        let max = values.clone().max().unwrap();
        let min = values.min().unwrap();
        max - min
    }

    fn horizontal_ramp(width: u32, height: u32, start: u8, span: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            Luma([start + (x * u32::from(span) / width) as u8])
        })
    }

    #[test]
    fn test_scale_abs_saturates() {
        let image = GrayImage::from_raw(3, 1, vec![0, 200, 250]).unwrap();
        let scaled = scale_abs(&image, 1.2, 8.0);
        assert_eq!(scaled.into_raw(), vec![8, 248, 255]);
    }

    #[test]
    fn test_clahe_keeps_uniform_image_uniform() {
        let image = GrayImage::from_pixel(64, 48, Luma([90]));
        let out = clahe(&image, 2.5, 8);

        assert_eq!(out.dimensions(), (64, 48));
        assert_eq!(range(&out), 0);
    }

    #[test]
    fn test_clahe_stretches_narrow_histogram() {
        let image = horizontal_ramp(128, 128, 100, 16);
        let out = clahe(&image, 2.5, 2);

        assert!(range(&out) > range(&image));
    }

    #[test]
    fn test_clahe_handles_images_smaller_than_grid() {
        let image = horizontal_ramp(3, 2, 10, 200);
        let out = clahe(&image, 2.5, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn test_day_mode_equalizes() {
        let image = horizontal_ramp(64, 8, 120, 8);
        let out = enhance(&image, EnhancementMode::Day, &NightParams::default()).unwrap();

        assert_eq!(out.dimensions(), image.dimensions());
        assert!(range(&out) > range(&image));
    }

    #[test]
    fn test_night_mode_brightens_dark_frame() {
        let image = GrayImage::from_pixel(32, 32, Luma([20]));
        let out = enhance(&image, EnhancementMode::Night, &NightParams::default()).unwrap();

        let mean_in: u32 = image.pixels().map(|p| u32::from(p.0[0])).sum();
        let mean_out: u32 = out.pixels().map(|p| u32::from(p.0[0])).sum();
        assert!(mean_out > mean_in);
    }

    #[test]
    fn test_night_mode_keeps_dimensions_without_denoising() {
        let image = horizontal_ramp(48, 40, 10, 40);
        let night = NightParams {
            denoise_strength: 0.0,
            ..NightParams::default()
        };
        let out = enhance(&image, EnhancementMode::Night, &night).unwrap();

        assert_eq!(out.dimensions(), (48, 40));
        assert!(out.pixels().all(|p| f32::from(p.0[0]) >= night.bias));
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let mode: EnhancementMode = serde_json::from_str("\"night\"").unwrap();
        assert_eq!(mode, EnhancementMode::Night);
    }
}
