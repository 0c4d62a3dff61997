//! Observation of intermediate pipeline artifacts.
//!
//! The pipeline hands every intermediate image to a [`StageObserver`]. The
//! default observer ignores them; [`DumpObserver`] writes them to disk as PNG
//! files for visual debugging.

use std::path::{Path, PathBuf};

use image::{GrayImage, Rgb, RgbImage, RgbaImage};
use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::colors::{contrasting_colors, random_colors};
use crate::labels::{LabelMap, RIDGE};
use crate::markers::{DistanceMap, normalize_distance};
use crate::region_labelling::{colorize_labels, draw_principal_basins};

/// Pipeline stage that produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Blurred,
    AnalysisChannel,
    Threshold,
    Opening,
    BackgroundArea,
    DistanceTransform,
    SureForeground,
    UnknownRegion,
    Markers,
    Watershed,
    WatershedOnImage,
    SureForegroundWatershed,
    Overlay,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Blurred => "blurred",
            Stage::AnalysisChannel => "analysis_channel",
            Stage::Threshold => "threshold",
            Stage::Opening => "opening",
            Stage::BackgroundArea => "background_area",
            Stage::DistanceTransform => "distance_transform",
            Stage::SureForeground => "sure_foreground",
            Stage::UnknownRegion => "unknown_region",
            Stage::Markers => "markers",
            Stage::Watershed => "watershed",
            Stage::WatershedOnImage => "watershed_on_image",
            Stage::SureForegroundWatershed => "sure_foreground_watershed",
            Stage::Overlay => "overlay",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ArtifactImage<'a> {
    Gray(&'a GrayImage),
    Rgb(&'a RgbImage),
    Rgba(&'a RgbaImage),
    Distance(&'a DistanceMap),
    Labels(&'a LabelMap),
}

/// An intermediate image borrowed from the running pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Artifact<'a> {
    pub stage: Stage,
    pub image: ArtifactImage<'a>,
    /// Ridge colour of the running configuration, for rendering label maps.
    pub ridge_color: Rgb<u8>,
}

/// Receives every intermediate artifact, in pipeline order.
pub trait StageObserver {
    fn observe(&mut self, artifact: &Artifact<'_>);

    /// Whether artifacts that exist only for diagnostics should be rendered at all.
    fn enabled(&self) -> bool {
        true
    }
}

impl<F> StageObserver for F
where
    F: FnMut(&Artifact<'_>),
{
    fn observe(&mut self, artifact: &Artifact<'_>) {
        self(artifact)
    }
}

/// Ignores every artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn observe(&mut self, _artifact: &Artifact<'_>) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Palette used when rendering label maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColoring {
    /// Random colors drawn from a generator seeded with the given value.
    Random { seed: u64 },
    /// Evenly spaced hues.
    Contrasting,
    /// Only the `count` largest basins, in evenly spaced hues; ridges keep the
    /// ridge colour and everything else is black.
    Principal { count: usize },
}

/// Writes every artifact to `<dir>/<stage>.png`.
///
/// Write failures are logged and otherwise ignored: dumps are diagnostics and
/// never abort a segmentation.
#[derive(Debug, Clone)]
pub struct DumpObserver {
    dir: PathBuf,
    coloring: LabelColoring,
    written: Vec<PathBuf>,
}

impl DumpObserver {
    pub fn new(dir: impl Into<PathBuf>, coloring: LabelColoring) -> Self {
        Self {
            dir: dir.into(),
            coloring,
            written: Vec::new(),
        }
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn render_labels(&self, labels: &LabelMap, ridge_color: Rgb<u8>) -> RgbImage {
        let n = labels.max_label() as usize + 1;
        let palette = match self.coloring {
            LabelColoring::Random { seed } => random_colors(n, &mut StdRng::seed_from_u64(seed)),
            LabelColoring::Contrasting => contrasting_colors(n),
            LabelColoring::Principal { count } => {
                let mut image = draw_principal_basins(labels, count, Rgb([0, 0, 0]));
                for (x, y, pixel) in image.enumerate_pixels_mut() {
                    if labels.get(x, y) == RIDGE {
                        *pixel = ridge_color;
                    }
                }
                return image;
            }
        };
        colorize_labels(labels, &palette, ridge_color)
    }

    fn record(&mut self, path: PathBuf, result: image::ImageResult<()>) {
        match result {
            Ok(()) => {
                debug!("dumped {}", path.display());
                self.written.push(path);
            }
            Err(e) => warn!("failed to dump {}: {e}", path.display()),
        }
    }
}

impl StageObserver for DumpObserver {
    fn observe(&mut self, artifact: &Artifact<'_>) {
        let path = self.dir.join(format!("{}.png", artifact.stage.name()));
        let result = match artifact.image {
            ArtifactImage::Gray(image) => image.save(&path),
            ArtifactImage::Rgb(image) => image.save(&path),
            ArtifactImage::Rgba(image) => image.save(&path),
            ArtifactImage::Distance(distance) => normalize_distance(distance).save(&path),
            ArtifactImage::Labels(labels) => {
                self.render_labels(labels, artifact.ridge_color).save(&path)
            }
        };
        self.record(path, result);
    }
}

/// Convenience for observers that only care about the output directory.
pub fn dump_to(dir: &Path, seed: u64) -> DumpObserver {
    DumpObserver::new(dir, LabelColoring::Random { seed })
}
