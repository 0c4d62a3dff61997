use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

use crate::error::{Result, SegmentationError};

/// Foreground value of every binary mask in the pipeline.
pub const FOREGROUND: u8 = 255;
/// Background value of every binary mask in the pipeline.
pub const BACKGROUND: u8 = 0;

/// Computes the Otsu level of a single-channel image.
///
/// The level maximises the inter-class variance of the histogram split and is a
/// pure function of the histogram, so repeated calls on the same image agree.
///
/// # Errors
///
/// Returns [`SegmentationError::DegenerateInput`] when every sample has the same
/// value: the variance is zero and no split is meaningful.
pub fn otsu_threshold(channel: &GrayImage) -> Result<u8> {
    let samples = channel.as_raw();
    let Some(&first) = samples.first() else {
        return Err(SegmentationError::EmptyImage {
            width: channel.width(),
            height: channel.height(),
        });
    };
    if samples.iter().all(|&v| v == first) {
        return Err(SegmentationError::DegenerateInput {
            stage: "threshold",
            value: first,
        });
    }
    Ok(otsu_level(channel))
}

/// Pixels strictly above `level` become [`FOREGROUND`], the rest [`BACKGROUND`].
pub fn binarize(channel: &GrayImage, level: u8) -> GrayImage {
    let mut mask = channel.clone();
    for pixel in mask.pixels_mut() {
        *pixel = if pixel.0[0] > level {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        };
    }
    mask
}
