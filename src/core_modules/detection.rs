// THEORY:
// A `Detection` is the raw output of the circle detector: one bubble candidate,
// described only by where it is and how big it is. It has no identity beyond its
// position, so everything downstream recovers "which question, which
// alternative" purely from coordinates.
//
// `Detection` and `DetectionSet` are plain data containers. The grid
// reconstructor never clones or reorders them; it builds ordered views made of
// indices into the `DetectionSet` instead.

use serde::{Deserialize, Serialize};

/// A single circular bubble candidate found on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Center of the circle in image pixels, `(x, y)`.
    pub center: (f32, f32),
    /// Radius of the circle in image pixels.
    pub radius: f32,
}

impl Detection {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            center: (x, y),
            radius,
        }
    }

    pub fn x(&self) -> f32 {
        self.center.0
    }

    pub fn y(&self) -> f32 {
        self.center.1
    }
}

/// The unsorted list of detections produced once per sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn as_slice(&self) -> &[Detection] {
        &self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }
}

impl From<Vec<Detection>> for DetectionSet {
    fn from(detections: Vec<Detection>) -> Self {
        Self::new(detections)
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}
