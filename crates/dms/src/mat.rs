//! Conversions between `image` buffers and OpenCV matrices

use crate::DmsError;
use image::GrayImage;
use opencv::{
    core::{Mat, Scalar, CV_8UC1},
    prelude::*,
};

pub(crate) fn cv_err(e: opencv::Error) -> DmsError {
    DmsError::ImageProcessing(e.to_string())
}

/// Copy a grayscale image into a single-channel 8-bit matrix
pub(crate) fn gray_to_mat(image: &GrayImage) -> Result<Mat, DmsError> {
    let mut mat = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        CV_8UC1,
        Scalar::all(0.0),
    )
    .map_err(cv_err)?;

    mat.data_bytes_mut()
        .map_err(cv_err)?
        .copy_from_slice(image.as_raw());
    Ok(mat)
}

/// Copy a continuous single-channel 8-bit matrix back into an image
pub(crate) fn mat_to_gray(mat: &Mat) -> Result<GrayImage, DmsError> {
    if mat.typ() != CV_8UC1 {
        return Err(DmsError::ImageProcessing(format!(
            "expected an 8-bit single-channel matrix, got type {}",
            mat.typ()
        )));
    }

    let bytes = mat.data_bytes().map_err(cv_err)?.to_vec();
    GrayImage::from_raw(mat.cols() as u32, mat.rows() as u32, bytes).ok_or_else(|| {
        DmsError::ImageProcessing(format!(
            "matrix data does not fit {}x{}",
            mat.cols(),
            mat.rows()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_to_mat_copies_pixels() {
        let image = GrayImage::from_fn(4, 3, |x, y| image::Luma([(y * 4 + x) as u8]));
        let mat = gray_to_mat(&image).unwrap();

        assert_eq!(mat.rows(), 3);
        assert_eq!(mat.cols(), 4);
        assert_eq!(*mat.at_2d::<u8>(2, 3).unwrap(), 11);
        assert_eq!(mat_to_gray(&mat).unwrap(), image);
    }
}
