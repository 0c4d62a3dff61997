//! Tunable parameters of the segmentation pipeline.
//!
//! The defaults are: 3x3 blur, Otsu threshold on
//! the red channel, 2x2 opening (2 iterations), 2x2 dilation (3 iterations),
//! Euclidean distance transform thresholded at 30% of its maximum, and
//! watershed ridges drawn in cyan over a half-transparent black overlay.

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentationError};

/// Sample layout of the incoming 4-channel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrder {
    #[default]
    Rgba,
    Bgra,
}

/// Colour channel used for thresholding.
///
/// Decoded grids are always stored as RGB, so the variant names the same
/// colour regardless of the source [`ChannelOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalysisChannel {
    #[default]
    Red,
    Green,
    Blue,
}

impl AnalysisChannel {
    /// Index of the channel inside an RGB pixel.
    pub fn index(self) -> usize {
        match self {
            AnalysisChannel::Red => 0,
            AnalysisChannel::Green => 1,
            AnalysisChannel::Blue => 2,
        }
    }
}

/// Metric of the distance transform feeding the marker generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    /// L1 distance, saturating at 255.
    Manhattan,
    /// L-infinity distance, saturating at 255.
    Chessboard,
}

/// Pixel adjacency used when labelling marker blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    Four,
    #[default]
    Eight,
}

impl From<Connectivity> for imageproc::region_labelling::Connectivity {
    fn from(value: Connectivity) -> Self {
        match value {
            Connectivity::Four => imageproc::region_labelling::Connectivity::Four,
            Connectivity::Eight => imageproc::region_labelling::Connectivity::Eight,
        }
    }
}

/// How watershed seeds are derived from the distance transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MarkerSeedStrategy {
    /// Keep every pixel farther than `tolerance * max_distance` from the background.
    #[default]
    DistanceThreshold,
    /// Keep the local maxima of the distance transform within a square window.
    LocalMaxima {
        #[serde(rename = "minDistance", default = "default_min_distance")]
        min_distance: u32,
    },
}

/// Window radius used by [`MarkerSeedStrategy::LocalMaxima`] when none is given.
pub const DEFAULT_MIN_DISTANCE: u32 = 5;

fn default_min_distance() -> u32 {
    DEFAULT_MIN_DISTANCE
}

impl MarkerSeedStrategy {
    /// Local-maxima seeding with the default window.
    pub fn local_maxima() -> Self {
        MarkerSeedStrategy::LocalMaxima {
            min_distance: DEFAULT_MIN_DISTANCE,
        }
    }
}

/// Colours and alphas of the rendered overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    pub ridge_color: [u8; 3],
    pub ridge_alpha: u8,
    pub background_alpha: u8,
}

impl OverlayStyle {
    pub fn ridge_rgb(&self) -> Rgb<u8> {
        Rgb(self.ridge_color)
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            ridge_color: [66, 244, 244],
            ridge_alpha: 255,
            background_alpha: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SegmentationConfig {
    pub channel_order: ChannelOrder,
    pub analysis_channel: AnalysisChannel,
    pub blur_kernel_size: u32,
    pub morph_kernel_size: u32,
    pub open_iterations: u32,
    pub dilate_iterations: u32,
    pub distance_transform_metric: DistanceMetric,
    pub tolerance: f32,
    pub connectivity: Connectivity,
    pub marker_seed_strategy: MarkerSeedStrategy,
    pub use_unknown_region_refinement: bool,
    #[serde(flatten)]
    pub overlay: OverlayStyle,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::Rgba,
            analysis_channel: AnalysisChannel::Red,
            blur_kernel_size: 3,
            morph_kernel_size: 2,
            open_iterations: 2,
            dilate_iterations: 3,
            distance_transform_metric: DistanceMetric::Euclidean,
            tolerance: 0.3,
            connectivity: Connectivity::Eight,
            marker_seed_strategy: MarkerSeedStrategy::DistanceThreshold,
            use_unknown_region_refinement: false,
            overlay: OverlayStyle::default(),
        }
    }
}

/// Largest morphology kernel accepted; the structuring element anchor is stored as a `u8`.
pub const MAX_MORPH_KERNEL_SIZE: u32 = 255;

impl SegmentationConfig {
    /// Parses a JSON document. Missing keys fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SegmentationError::InvalidConfig {
                field: "json",
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every parameter range before any pixel work happens.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: String| {
            Err(SegmentationError::InvalidConfig { field, reason })
        };

        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return invalid(
                "blurKernelSize",
                format!("must be odd and positive, got {}", self.blur_kernel_size),
            );
        }
        if self.morph_kernel_size == 0 || self.morph_kernel_size > MAX_MORPH_KERNEL_SIZE {
            return invalid(
                "morphKernelSize",
                format!(
                    "must be in 1..={MAX_MORPH_KERNEL_SIZE}, got {}",
                    self.morph_kernel_size
                ),
            );
        }
        if self.open_iterations == 0 {
            return invalid("openIterations", "must be positive".to_string());
        }
        if self.dilate_iterations == 0 {
            return invalid("dilateIterations", "must be positive".to_string());
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return invalid(
                "tolerance",
                format!("must lie in (0, 1), got {}", self.tolerance),
            );
        }
        if let MarkerSeedStrategy::LocalMaxima { min_distance } = self.marker_seed_strategy
            && min_distance == 0
        {
            return invalid(
                "markerSeedStrategy.minDistance",
                "must be positive".to_string(),
            );
        }
        if self.overlay.ridge_alpha == self.overlay.background_alpha {
            return invalid(
                "ridgeAlpha",
                format!(
                    "must differ from backgroundAlpha ({})",
                    self.overlay.background_alpha
                ),
            );
        }
        Ok(())
    }
}
