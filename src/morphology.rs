use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

/// A filled `size x size` structuring element anchored at `(size / 2, size / 2)`.
///
/// For even sizes the anchor sits right of and below the geometric centre, so a
/// 2x2 element covers the anchor pixel and its upper/left neighbours.
///
/// # Panics
///
/// Panics if `size` is zero or larger than 255; [`SegmentationConfig::validate`]
/// rejects both before the pipeline runs.
///
/// [`SegmentationConfig::validate`]: crate::config::SegmentationConfig::validate
pub fn structuring_element(size: u32) -> Mask {
    assert!(
        (1..=255).contains(&size),
        "structuring element size must be in 1..=255"
    );
    let anchor = (size / 2) as u8;
    let footprint = GrayImage::from_pixel(size, size, Luma([255]));
    Mask::from_image(&footprint, anchor, anchor)
}

/// Erodes `mask` `iterations` times with `element`.
pub fn erode(mask: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    (0..iterations).fold(mask.clone(), |acc, _| grayscale_erode(&acc, element))
}

/// Dilates `mask` `iterations` times with `element`.
pub fn dilate(mask: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    (0..iterations).fold(mask.clone(), |acc, _| grayscale_dilate(&acc, element))
}

/// Morphological opening: `iterations` erosions followed by as many dilations.
///
/// Removes foreground specks smaller than the eroded footprint while keeping the
/// extent of larger blobs.
pub fn open(mask: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    dilate(&erode(mask, element, iterations), element, iterations)
}
