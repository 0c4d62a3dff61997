//! Marker-controlled watershed by priority flooding.
//!
//! The topographic step between two 4-neighbours is the largest absolute
//! per-channel difference of their colours. Pixels are flooded from the
//! markers in order of increasing step, first-in first-out within a step, so
//! identical input always floods in the same order.

use std::collections::VecDeque;

use image::RgbImage;
use log::debug;

use crate::error::{Result, SegmentationError};
use crate::labels::{LabelMap, RIDGE, UNLABELED};

const LEVELS: usize = 256;
/// Working label of pixels waiting in a queue. Never visible in the output.
const IN_QUEUE: i32 = -2;

/// Elevation step between two colours.
fn step(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b)
        .map(|(&p, &q)| p.abs_diff(q))
        .max()
        .unwrap_or(0) as usize
}

/// One FIFO per elevation level plus a cursor on the lowest non-empty one.
struct FloodQueue {
    levels: Vec<VecDeque<usize>>,
    active: usize,
}

impl FloodQueue {
    fn new() -> Self {
        Self {
            levels: vec![VecDeque::new(); LEVELS],
            active: LEVELS,
        }
    }

    fn push(&mut self, level: usize, index: usize) {
        self.levels[level].push_back(index);
        self.active = self.active.min(level);
    }

    fn pop(&mut self) -> Option<usize> {
        while self.active < LEVELS {
            if let Some(index) = self.levels[self.active].pop_front() {
                return Some(index);
            }
            self.active += 1;
        }
        None
    }
}

/// Floods `markers` over `image` and returns the basin map with ridges.
///
/// Every positive marker keeps its label. Each unlabelled pixel reachable from a
/// marker receives the label of the basin that reaches it first, or [`RIDGE`]
/// when two different basins meet on it. Pixels unreachable from any marker,
/// which is every pixel when `markers` holds none, stay [`UNLABELED`].
///
/// # Errors
///
/// * [`SegmentationError::InvariantViolation`] if the dimensions disagree, if
///   `markers` holds a negative label other than [`RIDGE`], or if flooding
///   reaches a pixel without a labelled neighbour.
pub fn watershed(image: &RgbImage, markers: &LabelMap) -> Result<LabelMap> {
    if image.dimensions() != markers.dimensions() {
        return Err(SegmentationError::InvariantViolation {
            stage: "watershed",
            detail: format!(
                "image is {:?} but markers are {:?}",
                image.dimensions(),
                markers.dimensions()
            ),
        });
    }
    markers.validate("watershed")?;

    let (width, height) = (markers.width() as usize, markers.height() as usize);
    let pixels = image.as_raw();
    let color = |i: usize| &pixels[i * 3..i * 3 + 3];
    let neighbours = |i: usize| {
        let (x, y) = (i % width, i / width);
        [
            (x > 0).then(|| i - 1),
            (x + 1 < width).then(|| i + 1),
            (y > 0).then(|| i - width),
            (y + 1 < height).then(|| i + width),
        ]
        .into_iter()
        .flatten()
    };

    let mut result = markers.clone();
    let labels = result.as_mut_slice();
    let mut queue = FloodQueue::new();

    for i in 0..labels.len() {
        if labels[i] != UNLABELED {
            continue;
        }
        let seed_step = neighbours(i)
            .filter(|&n| labels[n] > 0)
            .map(|n| step(color(i), color(n)))
            .min();
        if let Some(level) = seed_step {
            queue.push(level, i);
            labels[i] = IN_QUEUE;
        }
    }

    let mut ridges = 0usize;
    while let Some(i) = queue.pop() {
        let mut label = UNLABELED;
        for n in neighbours(i) {
            let l = labels[n];
            if l <= 0 {
                continue;
            }
            if label == UNLABELED {
                label = l;
            } else if l != label {
                label = RIDGE;
            }
        }

        if label == UNLABELED {
            return Err(SegmentationError::InvariantViolation {
                stage: "watershed",
                detail: format!(
                    "queued pixel ({}, {}) has no labelled neighbour",
                    i % width,
                    i / width
                ),
            });
        }
        labels[i] = label;
        if label == RIDGE {
            ridges += 1;
            continue;
        }

        for n in neighbours(i) {
            if labels[n] == UNLABELED {
                queue.push(step(color(i), color(n)), n);
                labels[n] = IN_QUEUE;
            }
        }
    }

    debug!(
        "watershed: {}x{} basins={} ridges={}",
        width,
        height,
        markers.max_label(),
        ridges
    );

    Ok(result)
}
