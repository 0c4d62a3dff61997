use image::{Rgb, RgbImage};

use crate::colors::contrasting_colors;
use crate::labels::{LabelMap, RIDGE};

/// Paints every label with `colors[label]`, ridges with `ridge_color`.
///
/// Label `0` uses `colors[0]`. Labels beyond the palette wrap around it, so the
/// palette only needs `max_label + 1` entries for a collision-free rendering.
///
/// # Panics
///
/// Panics if `colors` is empty.
pub fn colorize_labels(labels: &LabelMap, colors: &[Rgb<u8>], ridge_color: Rgb<u8>) -> RgbImage {
    assert!(!colors.is_empty(), "colors must not be empty");
    RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
        match labels.get(x, y) {
            RIDGE => ridge_color,
            label => colors[label.max(0) as usize % colors.len()],
        }
    })
}

/// Colors the `n` largest basins with contrasting colors and everything else with `background`.
///
/// Basins are ranked by pixel count, ties broken by the smaller label. Ridges
/// and unlabelled pixels are painted with `background` too.
pub fn draw_principal_basins(labels: &LabelMap, n: usize, background: Rgb<u8>) -> RgbImage {
    let mut areas: Vec<(i32, usize)> = labels.basin_areas().into_iter().collect();
    areas.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    areas.truncate(n);

    let palette = contrasting_colors(areas.len());
    RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
        let label = labels.get(x, y);
        areas
            .iter()
            .position(|&(l, _)| l == label)
            .map_or(background, |rank| palette[rank])
    })
}
