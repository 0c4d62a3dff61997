use image::{Rgb, RgbImage, Rgba, RgbaImage};

use crate::config::OverlayStyle;
use crate::labels::{LabelMap, RIDGE};

/// Renders watershed ridges as an RGBA overlay.
///
/// Ridge pixels get `style.ridge_color` with `style.ridge_alpha`; every other
/// pixel is black with `style.background_alpha`.
pub fn overlay_mask(labels: &LabelMap, style: &OverlayStyle) -> RgbaImage {
    let [r, g, b] = style.ridge_color;
    let ridge = Rgba([r, g, b, style.ridge_alpha]);
    let background = Rgba([0, 0, 0, style.background_alpha]);

    RgbaImage::from_fn(labels.width(), labels.height(), |x, y| {
        if labels.get(x, y) == RIDGE {
            ridge
        } else {
            background
        }
    })
}

/// Returns a copy of `image` with every ridge pixel replaced by `color`.
pub fn paint_ridges(image: &RgbImage, labels: &LabelMap, color: Rgb<u8>) -> RgbImage {
    let mut painted = image.clone();
    for (x, y, pixel) in painted.enumerate_pixels_mut() {
        if labels.get(x, y) == RIDGE {
            *pixel = color;
        }
    }
    painted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_with_ridge() -> LabelMap {
        LabelMap::from_raw(3, 2, vec![1, RIDGE, 2, 0, RIDGE, 2]).unwrap()
    }

    #[test]
    fn overlay_uses_exactly_two_pixel_values() {
        let style = OverlayStyle::default();
        let overlay = overlay_mask(&labels_with_ridge(), &style);

        assert_eq!(overlay.get_pixel(1, 0), &Rgba([66, 244, 244, 255]));
        assert_eq!(overlay.get_pixel(1, 1), &Rgba([66, 244, 244, 255]));
        assert_eq!(overlay.get_pixel(0, 0), &Rgba([0, 0, 0, 128]));
        assert_eq!(overlay.get_pixel(0, 1), &Rgba([0, 0, 0, 128]));
        assert!(
            overlay
                .pixels()
                .all(|p| p.0[3] == style.ridge_alpha || p.0[3] == style.background_alpha)
        );
    }

    #[test]
    fn transparent_background_style() {
        let style = OverlayStyle {
            ridge_color: [255, 0, 0],
            ridge_alpha: 200,
            background_alpha: 0,
        };
        let overlay = overlay_mask(&labels_with_ridge(), &style);
        assert_eq!(overlay.get_pixel(1, 0), &Rgba([255, 0, 0, 200]));
        assert_eq!(overlay.get_pixel(2, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn paint_ridges_touches_only_ridges() {
        let image = RgbImage::from_pixel(3, 2, Rgb([9, 9, 9]));
        let painted = paint_ridges(&image, &labels_with_ridge(), Rgb([1, 2, 3]));
        assert_eq!(painted.get_pixel(1, 0), &Rgb([1, 2, 3]));
        assert_eq!(painted.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }
}
