use std::collections::BTreeMap;

use image::{ImageBuffer, Luma};

use crate::error::{Result, SegmentationError};

/// Label of pixels that were not reached by any marker.
pub const UNLABELED: i32 = 0;
/// Sentinel of watershed ridge pixels. No other negative label is legal.
pub const RIDGE: i32 = -1;

/// A dense, row-major map of signed region labels.
///
/// `0` marks unlabelled pixels, positive values identify a basin and [`RIDGE`]
/// marks pixels separating two basins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    data: Vec<i32>,
}

impl LabelMap {
    /// An all-[`UNLABELED`] map.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![UNLABELED; width as usize * height as usize],
        }
    }

    /// Wraps raw labels, checking only the buffer length.
    pub fn from_raw(width: u32, height: u32, data: Vec<i32>) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(SegmentationError::InvariantViolation {
                stage: "labels",
                detail: format!(
                    "{} labels cannot fill a {width}x{height} map",
                    data.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Converts the output of `imageproc::region_labelling::connected_components`.
    pub fn from_components(components: &ImageBuffer<Luma<u32>, Vec<u32>>) -> Result<Self> {
        let data = components
            .as_raw()
            .iter()
            .map(|&label| {
                i32::try_from(label).map_err(|_| SegmentationError::InvariantViolation {
                    stage: "markers",
                    detail: format!("component label {label} exceeds i32"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_raw(components.width(), components.height(), data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.data
    }

    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, label: i32) {
        let i = self.index(x, y);
        self.data[i] = label;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Largest positive label, or `0` if the map holds no basin.
    pub fn max_label(&self) -> i32 {
        self.data.iter().copied().max().unwrap_or(UNLABELED).max(UNLABELED)
    }

    /// Number of pixels carrying the [`RIDGE`] sentinel.
    pub fn ridge_count(&self) -> usize {
        self.data.iter().filter(|&&l| l == RIDGE).count()
    }

    /// Pixel count of every positive label, keyed by label.
    pub fn basin_areas(&self) -> BTreeMap<i32, usize> {
        let mut areas = BTreeMap::new();
        for &label in self.data.iter().filter(|&&l| l > 0) {
            *areas.entry(label).or_insert(0) += 1;
        }
        areas
    }

    /// Ensures every label lies in `{0} ∪ {1..} ∪ {RIDGE}`.
    pub fn validate(&self, stage: &'static str) -> Result<()> {
        match self.data.iter().position(|&l| l < RIDGE) {
            None => Ok(()),
            Some(i) => Err(SegmentationError::InvariantViolation {
                stage,
                detail: format!(
                    "illegal label {} at ({}, {})",
                    self.data[i],
                    i % self.width as usize,
                    i / self.width as usize
                ),
            }),
        }
    }
}
