use image::{Rgb, RgbImage, Rgba, RgbaImage};

use crate::config::ChannelOrder;
use crate::error::{Result, SegmentationError};

const SOURCE_CHANNELS: usize = 4;

/// Decodes a raw, row-major 4-channel buffer into an RGB pixel grid.
///
/// The alpha channel is dropped and `order` is normalised so the returned grid
/// is always RGB. No resizing or colour-space conversion takes place.
///
/// # Errors
///
/// * [`SegmentationError::EmptyImage`] if either dimension is zero.
/// * [`SegmentationError::Decode`] if `bytes.len() != width * height * 4`.
///
/// # Examples
///
/// ```
/// use image_watershed::config::ChannelOrder;
/// use image_watershed::decode::decode_rgba;
///
/// let bytes = [10, 20, 30, 255, 40, 50, 60, 255];
/// let grid = decode_rgba(&bytes, 2, 1, ChannelOrder::Bgra).unwrap();
///
/// assert_eq!(grid.get_pixel(0, 0).0, [30, 20, 10]);
/// assert_eq!(grid.get_pixel(1, 0).0, [60, 50, 40]);
/// ```
pub fn decode_rgba(bytes: &[u8], width: u32, height: u32, order: ChannelOrder) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(SegmentationError::EmptyImage { width, height });
    }

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(SOURCE_CHANNELS))
        .ok_or(SegmentationError::Decode {
            expected: usize::MAX,
            actual: bytes.len(),
            width,
            height,
        })?;
    if bytes.len() != expected {
        return Err(SegmentationError::Decode {
            expected,
            actual: bytes.len(),
            width,
            height,
        });
    }

    let mut samples = Vec::with_capacity(expected / SOURCE_CHANNELS * 3);
    for px in bytes.chunks_exact(SOURCE_CHANNELS) {
        match order {
            ChannelOrder::Rgba => samples.extend_from_slice(&[px[0], px[1], px[2]]),
            ChannelOrder::Bgra => samples.extend_from_slice(&[px[2], px[1], px[0]]),
        }
    }

    RgbImage::from_raw(width, height, samples).ok_or(SegmentationError::InvariantViolation {
        stage: "decode",
        detail: format!("sample buffer does not fit {width}x{height}"),
    })
}

/// Re-adds a constant alpha channel, producing a row-major RGBA8 buffer.
pub fn encode_rgba(grid: &RgbImage, alpha: u8) -> Vec<u8> {
    to_rgba_image(grid, alpha).into_raw()
}

pub(crate) fn to_rgba_image(grid: &RgbImage, alpha: u8) -> RgbaImage {
    RgbaImage::from_fn(grid.width(), grid.height(), |x, y| {
        let Rgb([r, g, b]) = *grid.get_pixel(x, y);
        Rgba([r, g, b, alpha])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_rgba(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let v = (i * 37 % 256) as u8;
                [v, v.wrapping_add(1), v.wrapping_add(2), 200]
            })
            .collect()
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let mut bytes = checker_rgba(8, 6);
        bytes.pop();
        let err = decode_rgba(&bytes, 8, 6, ChannelOrder::Rgba).unwrap_err();
        assert_eq!(
            err,
            SegmentationError::Decode {
                expected: 192,
                actual: 191,
                width: 8,
                height: 6
            }
        );
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        let mut bytes = checker_rgba(4, 4);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            decode_rgba(&bytes, 4, 4, ChannelOrder::Rgba),
            Err(SegmentationError::Decode { .. })
        ));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            decode_rgba(&[], 0, 5, ChannelOrder::Rgba),
            Err(SegmentationError::EmptyImage {
                width: 0,
                height: 5
            })
        );
    }

    #[test]
    fn decode_then_encode_keeps_rgb_samples() {
        let bytes = checker_rgba(7, 5);
        let grid = decode_rgba(&bytes, 7, 5, ChannelOrder::Rgba).unwrap();
        let encoded = encode_rgba(&grid, 200);
        assert_eq!(encoded, bytes);

        let opaque = encode_rgba(&grid, 255);
        for (src, dst) in bytes.chunks_exact(4).zip(opaque.chunks_exact(4)) {
            assert_eq!(src[..3], dst[..3]);
            assert_eq!(dst[3], 255);
        }
    }

    #[test]
    fn bgra_is_normalised_to_rgb() {
        let grid = decode_rgba(&[1, 2, 3, 4], 1, 1, ChannelOrder::Bgra).unwrap();
        assert_eq!(grid.get_pixel(0, 0).0, [3, 2, 1]);
    }
}
