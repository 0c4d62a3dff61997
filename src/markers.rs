//! Watershed seeds derived from the distance transform of the cleaned mask.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::distance_transform::{self, Norm, euclidean_squared_distance_transform};
use imageproc::region_labelling::connected_components;
use log::debug;

use crate::config::{Connectivity, DistanceMetric, MarkerSeedStrategy};
use crate::error::Result;
use crate::labels::LabelMap;
use crate::threshold::{BACKGROUND, FOREGROUND};

/// Per-pixel distance to the nearest background pixel.
pub type DistanceMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Distance from every pixel of `mask` to the nearest [`BACKGROUND`] pixel.
///
/// Background pixels get `0`. If `mask` contains no background at all, every
/// pixel is infinitely far from it and gets `f32::INFINITY`.
pub fn distance_transform(mask: &GrayImage, metric: DistanceMetric) -> DistanceMap {
    let (width, height) = mask.dimensions();
    if !mask.pixels().any(|p| p.0[0] == BACKGROUND) {
        return DistanceMap::from_pixel(width, height, Luma([f32::INFINITY]));
    }

    // imageproc measures distance to the nearest non-zero pixel, so swap roles.
    let mut inverted = mask.clone();
    for pixel in inverted.pixels_mut() {
        pixel.0[0] = if pixel.0[0] == BACKGROUND {
            FOREGROUND
        } else {
            BACKGROUND
        };
    }

    match metric {
        DistanceMetric::Euclidean => {
            let squared = euclidean_squared_distance_transform(&inverted);
            DistanceMap::from_fn(width, height, |x, y| {
                Luma([squared.get_pixel(x, y).0[0].sqrt() as f32])
            })
        }
        DistanceMetric::Manhattan | DistanceMetric::Chessboard => {
            let norm = if metric == DistanceMetric::Manhattan {
                Norm::L1
            } else {
                Norm::LInf
            };
            let saturated = distance_transform::distance_transform(&inverted, norm);
            DistanceMap::from_fn(width, height, |x, y| {
                Luma([f32::from(saturated.get_pixel(x, y).0[0])])
            })
        }
    }
}

/// Largest value of a distance map, `0.0` for an empty map.
pub fn max_distance(distance: &DistanceMap) -> f32 {
    distance.pixels().map(|p| p.0[0]).fold(0.0, f32::max)
}

/// Keeps pixels strictly farther than `tolerance * max_distance` from the background.
pub fn sure_foreground(distance: &DistanceMap, tolerance: f32) -> GrayImage {
    let max = max_distance(distance);
    let cutoff = tolerance * max;
    let keep = |d: f32| {
        if max.is_finite() {
            d > cutoff
        } else {
            d.is_infinite()
        }
    };
    GrayImage::from_fn(distance.width(), distance.height(), |x, y| {
        if keep(distance.get_pixel(x, y).0[0]) {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Keeps positive pixels that are maximal within a `(2 * min_distance + 1)²` window.
///
/// Plateaus keep every tied pixel; labelling merges them into one seed afterwards.
pub fn local_maxima(distance: &DistanceMap, min_distance: u32) -> GrayImage {
    let (width, height) = distance.dimensions();
    let r = min_distance as i64;
    GrayImage::from_fn(width, height, |x, y| {
        let value = distance.get_pixel(x, y).0[0];
        if value <= 0.0 {
            return Luma([BACKGROUND]);
        }
        let (cx, cy) = (x as i64, y as i64);
        let y_range = (cy - r).max(0)..=(cy + r).min(height as i64 - 1);
        let is_peak = y_range.into_iter().all(|ny| {
            ((cx - r).max(0)..=(cx + r).min(width as i64 - 1))
                .all(|nx| distance.get_pixel(nx as u32, ny as u32).0[0] <= value)
        });
        if is_peak {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Labels the connected foreground blobs of `mask` as `1..=K`; background stays `0`.
pub fn label_components(mask: &GrayImage, connectivity: Connectivity) -> Result<LabelMap> {
    let components = connected_components(mask, connectivity.into(), Luma([BACKGROUND]));
    LabelMap::from_components(&components)
}

/// Intermediate products of marker generation.
#[derive(Debug, Clone)]
pub struct MarkerSeeds {
    pub distance: DistanceMap,
    pub sure_foreground: GrayImage,
    pub markers: LabelMap,
}

impl MarkerSeeds {
    pub fn count(&self) -> usize {
        self.markers.max_label() as usize
    }
}

/// Runs the distance transform, seed selection and labelling on an opened mask.
pub fn generate_markers(
    opened: &GrayImage,
    metric: DistanceMetric,
    strategy: MarkerSeedStrategy,
    tolerance: f32,
    connectivity: Connectivity,
) -> Result<MarkerSeeds> {
    let distance = distance_transform(opened, metric);
    let sure_foreground = match strategy {
        MarkerSeedStrategy::DistanceThreshold => sure_foreground(&distance, tolerance),
        MarkerSeedStrategy::LocalMaxima { min_distance } => local_maxima(&distance, min_distance),
    };
    let markers = label_components(&sure_foreground, connectivity)?;

    debug!(
        "markers: strategy={:?} max_distance={} markers={}",
        strategy,
        max_distance(&distance),
        markers.max_label()
    );

    Ok(MarkerSeeds {
        distance,
        sure_foreground,
        markers,
    })
}

/// Shifts every marker up by one and clears the unknown region.
///
/// The unknown region is the part of `background_area` that is not
/// `sure_foreground`. After the shift, pixels outside `background_area` carry
/// label `1` and act as an explicit background seed.
pub fn apply_unknown_region(
    markers: &LabelMap,
    background_area: &GrayImage,
    sure_foreground: &GrayImage,
) -> (LabelMap, GrayImage) {
    let (width, height) = markers.dimensions();
    let unknown = GrayImage::from_fn(width, height, |x, y| {
        let area = background_area.get_pixel(x, y).0[0];
        let sure = sure_foreground.get_pixel(x, y).0[0];
        Luma([area.saturating_sub(sure)])
    });

    let mut refined = markers.clone();
    for y in 0..height {
        for x in 0..width {
            let label = if unknown.get_pixel(x, y).0[0] == FOREGROUND {
                0
            } else {
                markers.get(x, y) + 1
            };
            refined.set(x, y, label);
        }
    }
    (refined, unknown)
}

/// Scales a distance map to `0..=255` for display.
pub fn normalize_distance(distance: &DistanceMap) -> GrayImage {
    let max = max_distance(distance);
    GrayImage::from_fn(distance.width(), distance.height(), |x, y| {
        let d = distance.get_pixel(x, y).0[0];
        let v = if !max.is_finite() {
            255.0
        } else if max > 0.0 {
            d * 255.0 / max
        } else {
            0.0
        };
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}
