//! Conversions between image files and prediction arrays

use crate::io::error::{InferenceError, Result};
use image::{DynamicImage, GrayImage, Luma};
use ndarray::{Array3, ArrayView2};
use std::path::Path;

/// Convert a decoded image into a `(rows, cols, channels)` array in `[0, 1]`
///
/// Grayscale images (with or without alpha) yield one channel; everything
/// else yields three RGB channels. Alpha is dropped.
///
/// # Errors
///
/// Returns [`InferenceError::InvalidInput`] if the pixel buffer does not
/// match the reported dimensions
pub fn image_to_array(image: &DynamicImage) -> Result<Array3<f32>> {
    let rows = image.height() as usize;
    let cols = image.width() as usize;
    let (channels, raw) = if image.color().has_color() {
        (3, image.to_rgb32f().into_raw())
    } else {
        (1, image.to_luma32f().into_raw())
    };
    Array3::from_shape_vec((rows, cols, channels), raw).map_err(|e| InferenceError::InvalidInput {
        reason: format!("decoded pixel buffer does not match {rows}x{cols}x{channels}: {e}"),
    })
}

/// Load an image file as a `(rows, cols, channels)` array
///
/// # Errors
///
/// Returns [`InferenceError::ImageLoad`] if the file cannot be decoded
pub fn load_image(path: &Path) -> Result<Array3<f32>> {
    let decoded = image::open(path).map_err(|e| InferenceError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    image_to_array(&decoded)
}

/// Render a class map as 8-bit gray levels spread over `num_classes`
pub fn class_map_to_gray(argmax: ArrayView2<'_, usize>, num_classes: usize) -> GrayImage {
    let (rows, cols) = argmax.dim();
    let top = num_classes.saturating_sub(1).max(1);
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let class = argmax
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(0)
            .min(top);
        Luma([(class * 255 / top) as u8])
    })
}

/// Render an uncertainty map as 8-bit gray levels, clamping to `[0, 1]`
pub fn uncertainty_to_gray(uncertainty: ArrayView2<'_, f32>) -> GrayImage {
    let (rows, cols) = uncertainty.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = uncertainty
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(0.0);
        Luma([(value.clamp(0.0, 1.0) * 255.0).round() as u8])
    })
}

/// Save a grayscale preview, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the image
/// cannot be encoded
pub fn save_gray(image: &GrayImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InferenceError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    image
        .save(output_path)
        .map_err(|e| InferenceError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })
}
