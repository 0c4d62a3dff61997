use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::separable_filter_equal;

use crate::config::AnalysisChannel;

/// Normalised 1-D Gaussian kernel of odd length `size`.
///
/// Sigma follows the usual fixed-aperture convention
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`, i.e. `0.8` for a 3-tap kernel.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let radius = (size / 2) as i32;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Smooths every channel with a square `kernel_size x kernel_size` Gaussian.
pub fn gaussian_blur(image: &RgbImage, kernel_size: u32) -> RgbImage {
    if kernel_size <= 1 {
        return image.clone();
    }
    separable_filter_equal(image, &gaussian_kernel(kernel_size))
}

/// Copies one colour channel into a single-channel image.
pub fn extract_channel(image: &RgbImage, channel: AnalysisChannel) -> GrayImage {
    let index = channel.index();
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y).0[index]])
    })
}
