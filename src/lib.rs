//! Marker-based watershed segmentation of RGBA bitmaps, built on [imageproc].
//!
//! The pipeline blurs the image, thresholds one colour channel with Otsu's
//! method, cleans the mask morphologically, seeds markers from its distance
//! transform and floods them with a watershed. The ridges between basins are
//! returned as an RGBA overlay.
//!
//! ```
//! use image::{Rgb, RgbImage};
//! use image_watershed::{SegmentationConfig, segment};
//!
//! let image = RgbImage::from_fn(64, 64, |x, y| {
//!     if (16..48).contains(&x) && (16..48).contains(&y) {
//!         Rgb([255, 255, 255])
//!     } else {
//!         Rgb([0, 0, 0])
//!     }
//! });
//!
//! let overlay = segment(&image, &SegmentationConfig::default()).unwrap();
//! assert_eq!(overlay.dimensions(), (64, 64));
//! ```

mod colors;
pub mod config;
pub mod decode;
pub mod diagnostics;
pub mod error;
pub mod labels;
pub mod markers;
pub mod morphology;
pub mod overlay;
pub mod pipeline;
pub mod preprocess;
pub mod region_labelling;
pub mod threshold;
pub mod watershed;

pub use colors::{contrasting_colors, random_colors};
pub use config::{MarkerSeedStrategy, OverlayStyle, SegmentationConfig};
pub use error::{Result, SegmentationError};
pub use labels::{LabelMap, RIDGE};
pub use pipeline::{Segmentation, Segmenter, segment, segment_rgba};
