// THEORY:
// The `GridReconstructor` turns the detector's unordered bag of circles into an
// ordered question-by-alternative grid, using nothing but coordinates. A single
// indexing mistake here silently misgrades the whole sheet, so every step either
// fully succeeds or reports exactly where the layout and the detections disagree.
//
// Algorithm steps:
// 1.  **Count Check**: The detector must report exactly `questions * alternatives`
//     bubbles. Anything else means a 1:1 correspondence is impossible.
// 2.  **Row Banding**: Detections are sorted top to bottom. The first band is the
//     first `column_blocks * alternatives` detections, because every block starts
//     on the same line. Each later band takes the topmost remaining detection,
//     uses its `y + radius` as a ceiling and swallows everything at or above it.
//     Every band is then sorted left to right, which interleaves the blocks.
// 3.  **Question Mapping**: Questions run block-major. Question `q` lives in band
//     `q % rows` at block `q / rows`, i.e. the slice of that band starting at
//     `block * alternatives`. Alternative 0 is the leftmost bubble of the slice.
// 4.  **Stateless Utility**: Like the `MarkClassifier`, this keeps no state between
//     sheets. The resulting `Grid` only borrows the detections and stores indices.

use crate::core_modules::detection::Detection;
use crate::core_modules::layout::LayoutConfig;
use crate::error::{GradingError, Result};

/// The reconstructed answer grid: for each question, its alternatives left to right.
///
/// Slots are indices into the borrowed detection slice, so detections are never
/// copied or reordered.
#[derive(Debug, Clone)]
pub struct Grid<'a> {
    detections: &'a [Detection],
    alternatives_per_question: usize,
    /// Flattened `question * alternatives + alternative -> detection index`.
    slots: Vec<usize>,
}

impl<'a> Grid<'a> {
    pub fn question_count(&self) -> usize {
        self.slots.len() / self.alternatives_per_question
    }

    pub fn alternatives_per_question(&self) -> usize {
        self.alternatives_per_question
    }

    /// The bubble for `alternative` of `question`.
    pub fn region(&self, question: usize, alternative: usize) -> &'a Detection {
        let detections: &'a [Detection] = self.detections;
        &detections[self.detection_index(question, alternative)]
    }

    /// Index of the slot's detection in the original detection slice.
    pub fn detection_index(&self, question: usize, alternative: usize) -> usize {
        assert!(alternative < self.alternatives_per_question);
        self.slots[question * self.alternatives_per_question + alternative]
    }

    /// The bubbles of `question`, alternative 0 first.
    pub fn alternatives(&self, question: usize) -> impl Iterator<Item = &'a Detection> + '_ {
        let detections: &'a [Detection] = self.detections;
        let start = question * self.alternatives_per_question;
        self.slots[start..start + self.alternatives_per_question]
            .iter()
            .map(move |&i| &detections[i])
    }

    /// Every detection the grid was built from, in detector order.
    pub fn detections(&self) -> &'a [Detection] {
        self.detections
    }
}

pub mod grid_reconstructor {
    use super::*; // Make the grid types from the parent module available.

    /// Rebuilds the question/alternative grid from raw detections.
    pub fn reconstruct<'a>(detections: &'a [Detection], layout: &LayoutConfig) -> Result<Grid<'a>> {
        // --- 1. Count Check ---
        let expected = layout.expected_detections();
        if detections.len() != expected {
            return Err(GradingError::DetectionCountMismatch {
                expected,
                found: detections.len(),
            });
        }

        // --- 2. Row Banding ---
        let bands = form_bands(detections, layout)?;

        // --- 3. Question Mapping ---
        let slots = map_bands_to_questions(&bands, layout)?;

        Ok(Grid {
            detections,
            alternatives_per_question: layout.alternatives_per_question(),
            slots,
        })
    }

    /// Splits the detections into horizontal bands, each sorted left to right.
    fn form_bands(detections: &[Detection], layout: &LayoutConfig) -> Result<Vec<Vec<usize>>> {
        let rows = layout.rows_per_column_block();

        // Stable sort: detections on the same line keep detector order until the x sort.
        let mut by_y: Vec<usize> = (0..detections.len()).collect();
        by_y.sort_by(|&a, &b| detections[a].y().total_cmp(&detections[b].y()));

        let mut bands = Vec::with_capacity(rows);
        let first_band_len = layout.first_band_size().min(by_y.len());
        let (first_band, mut remaining) = by_y.split_at(first_band_len);
        bands.push(sorted_by_x(first_band, detections));
        tracing::debug!(band = 0, size = first_band_len, "formed first row band");

        while bands.len() < rows {
            let Some(&leader) = remaining.first() else {
                return Err(GradingError::InsufficientBands {
                    formed: bands.len(),
                    expected: rows,
                });
            };

            let ceiling = detections[leader].y() + detections[leader].radius;
            // `remaining` is sorted by y, so the members form a prefix.
            let band_len = remaining.partition_point(|&i| detections[i].y() <= ceiling);
            let (band, rest) = remaining.split_at(band_len);
            tracing::debug!(band = bands.len(), size = band_len, ceiling, "formed row band");

            bands.push(sorted_by_x(band, detections));
            remaining = rest;
        }

        Ok(bands)
    }

    fn sorted_by_x(band: &[usize], detections: &[Detection]) -> Vec<usize> {
        let mut band = band.to_vec();
        band.sort_by(|&a, &b| detections[a].x().total_cmp(&detections[b].x()));
        band
    }

    fn map_bands_to_questions(bands: &[Vec<usize>], layout: &LayoutConfig) -> Result<Vec<usize>> {
        let rows = layout.rows_per_column_block();
        let alternatives = layout.alternatives_per_question();
        let mut slots = Vec::with_capacity(layout.expected_detections());

        for question in 0..layout.question_count() {
            let band_index = question % rows;
            let block = question / rows;
            let band = &bands[band_index];

            let start = block * alternatives;
            let end = start + alternatives;
            if end > band.len() {
                return Err(GradingError::BandUnderfilled {
                    band: band_index,
                    question,
                    needed: end,
                    found: band.len(),
                });
            }
            slots.extend_from_slice(&band[start..end]);
        }

        Ok(slots)
    }
}
