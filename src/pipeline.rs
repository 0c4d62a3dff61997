//! The complete segmentation pipeline.
//!
//! Stages run strictly in order, each consuming the previous stage's output:
//! blur, channel extraction, Otsu threshold, opening, background dilation,
//! marker generation, watershed and overlay rendering.

use image::{DynamicImage, RgbImage, RgbaImage};
use log::{debug, info};

use crate::config::SegmentationConfig;
use crate::decode::decode_rgba;
use crate::diagnostics::{Artifact, ArtifactImage, NoopObserver, Stage, StageObserver};
use crate::error::{Result, SegmentationError};
use crate::labels::LabelMap;
use crate::markers::{apply_unknown_region, generate_markers};
use crate::morphology::{dilate, open, structuring_element};
use crate::overlay::{overlay_mask, paint_ridges};
use crate::preprocess::{extract_channel, gaussian_blur};
use crate::threshold::{binarize, otsu_threshold};
use crate::watershed::watershed;

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Otsu level chosen on the analysis channel.
    pub threshold: u8,
    /// Number of markers the watershed was seeded with.
    pub marker_count: usize,
    pub labels: LabelMap,
    pub overlay: RgbaImage,
}

/// A configured pipeline with an attached [`StageObserver`].
///
/// A `Segmenter` holds no per-image state; one instance can process any number
/// of images, and independent instances can run on separate threads.
#[derive(Debug)]
pub struct Segmenter<O = NoopObserver> {
    config: SegmentationConfig,
    observer: O,
}

impl Segmenter<NoopObserver> {
    /// Validates `config` and builds a pipeline without diagnostics.
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: NoopObserver,
        })
    }
}

impl<O: StageObserver> Segmenter<O> {
    /// Replaces the observer receiving intermediate artifacts.
    pub fn with_observer<P: StageObserver>(self, observer: P) -> Segmenter<P> {
        Segmenter {
            config: self.config,
            observer,
        }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    fn emit(&mut self, stage: Stage, image: ArtifactImage<'_>) {
        let ridge_color = self.config.overlay.ridge_rgb();
        self.observer.observe(&Artifact {
            stage,
            image,
            ridge_color,
        });
    }

    /// Decodes a raw 4-channel buffer with the configured channel order and segments it.
    pub fn run_rgba(&mut self, bytes: &[u8], width: u32, height: u32) -> Result<Segmentation> {
        let image = decode_rgba(bytes, width, height, self.config.channel_order)?;
        self.run(&image)
    }

    /// Segments an RGB image.
    ///
    /// # Errors
    ///
    /// * [`SegmentationError::EmptyImage`] if the image has no pixels.
    /// * [`SegmentationError::DegenerateInput`] if the analysis channel is constant
    ///   after blurring.
    /// * [`SegmentationError::InvariantViolation`] on internal inconsistencies.
    pub fn run(&mut self, image: &RgbImage) -> Result<Segmentation> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SegmentationError::EmptyImage { width, height });
        }
        let config = self.config.clone();

        let blurred = gaussian_blur(image, config.blur_kernel_size);
        self.emit(Stage::Blurred, ArtifactImage::Rgb(&blurred));

        let channel = extract_channel(&blurred, config.analysis_channel);
        self.emit(Stage::AnalysisChannel, ArtifactImage::Gray(&channel));

        let threshold = otsu_threshold(&channel)?;
        let mask = binarize(&channel, threshold);
        debug!("threshold: {:?} level={}", config.analysis_channel, threshold);
        self.emit(Stage::Threshold, ArtifactImage::Gray(&mask));

        let element = structuring_element(config.morph_kernel_size);
        let opening = open(&mask, &element, config.open_iterations);
        self.emit(Stage::Opening, ArtifactImage::Gray(&opening));
        let background_area = dilate(&opening, &element, config.dilate_iterations);
        self.emit(Stage::BackgroundArea, ArtifactImage::Gray(&background_area));

        let seeds = generate_markers(
            &opening,
            config.distance_transform_metric,
            config.marker_seed_strategy,
            config.tolerance,
            config.connectivity,
        )?;
        self.emit(Stage::DistanceTransform, ArtifactImage::Distance(&seeds.distance));
        self.emit(Stage::SureForeground, ArtifactImage::Gray(&seeds.sure_foreground));

        let markers = if config.use_unknown_region_refinement {
            let (refined, unknown) =
                apply_unknown_region(&seeds.markers, &background_area, &seeds.sure_foreground);
            self.emit(Stage::UnknownRegion, ArtifactImage::Gray(&unknown));
            refined
        } else {
            seeds.markers.clone()
        };
        self.emit(Stage::Markers, ArtifactImage::Labels(&markers));

        let labels = watershed(&blurred, &markers)?;
        labels.validate("watershed")?;
        self.emit(Stage::Watershed, ArtifactImage::Labels(&labels));

        if self.observer.enabled() {
            let ridge = config.overlay.ridge_rgb();
            let on_image = paint_ridges(&blurred, &labels, ridge);
            self.emit(Stage::WatershedOnImage, ArtifactImage::Rgb(&on_image));

            let sure_rgb = DynamicImage::ImageLuma8(seeds.sure_foreground.clone()).to_rgb8();
            let on_sure = paint_ridges(&sure_rgb, &labels, ridge);
            self.emit(Stage::SureForegroundWatershed, ArtifactImage::Rgb(&on_sure));
        }

        let overlay = overlay_mask(&labels, &config.overlay);
        self.emit(Stage::Overlay, ArtifactImage::Rgba(&overlay));

        let marker_count = markers.max_label() as usize;
        info!(
            "segmented {}x{}: threshold={} markers={} ridges={}",
            width,
            height,
            threshold,
            marker_count,
            labels.ridge_count()
        );

        Ok(Segmentation {
            threshold,
            marker_count,
            labels,
            overlay,
        })
    }
}

/// Segments `image` and returns the ridge overlay.
pub fn segment(image: &RgbImage, config: &SegmentationConfig) -> Result<RgbaImage> {
    Segmenter::new(config.clone())?
        .run(image)
        .map(|segmentation| segmentation.overlay)
}

/// Decodes a raw RGBA8 (or BGRA8, per `config.channel_order`) buffer and segments it.
pub fn segment_rgba(
    bytes: &[u8],
    width: u32,
    height: u32,
    config: &SegmentationConfig,
) -> Result<RgbaImage> {
    Segmenter::new(config.clone())?
        .run_rgba(bytes, width, height)
        .map(|segmentation| segmentation.overlay)
}
