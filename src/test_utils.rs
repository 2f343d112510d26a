//! Synthetic answer sheets for unit tests.

use crate::core_modules::detection::Detection;
use crate::core_modules::layout::LayoutConfig;
use crate::core_modules::vision::{ImageprocVision, SheetVision};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

const RADIUS: f32 = 10.0;
const ALTERNATIVE_PITCH: f32 = 30.0;
const ROW_PITCH: f32 = 40.0;
const BLOCK_GAP: f32 = 40.0;
const MARGIN: f32 = 40.0;

/// A perfectly regular sheet: bubbles on an exact grid, blocks side by side.
pub(crate) struct IdealSheet {
    layout: LayoutConfig,
}

impl IdealSheet {
    pub(crate) fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub(crate) fn layout(&self) -> LayoutConfig {
        self.layout
    }

    fn block_width(&self) -> f32 {
        self.layout.alternatives_per_question() as f32 * ALTERNATIVE_PITCH + BLOCK_GAP
    }

    /// Where the bubble of `alternative` for `question` sits on this sheet.
    pub(crate) fn bubble(&self, question: usize, alternative: usize) -> Detection {
        let rows = self.layout.rows_per_column_block();
        let block = question / rows;
        let row = question % rows;
        Detection::new(
            MARGIN + block as f32 * self.block_width() + alternative as f32 * ALTERNATIVE_PITCH,
            MARGIN + row as f32 * ROW_PITCH,
            RADIUS,
        )
    }

    /// Every bubble, question by question.
    pub(crate) fn detections(&self) -> Vec<Detection> {
        (0..self.layout.question_count())
            .flat_map(|q| (0..self.layout.alternatives_per_question()).map(move |a| (q, a)))
            .map(|(q, a)| self.bubble(q, a))
            .collect()
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        let width = 2.0 * MARGIN + self.layout.column_blocks() as f32 * self.block_width();
        let height = 2.0 * MARGIN + self.layout.rows_per_column_block() as f32 * ROW_PITCH;
        (width as u32, height as u32)
    }

    /// White paper with black bubble outlines; `marks` are `(question, alternative)` pairs inked in.
    pub(crate) fn render(&self, marks: &[(usize, usize)]) -> GrayImage {
        let (width, height) = self.dimensions();
        let mut image = GrayImage::from_pixel(width, height, Luma([255u8]));
        for bubble in self.detections() {
            draw_hollow_circle_mut(
                &mut image,
                (bubble.x() as i32, bubble.y() as i32),
                bubble.radius as i32,
                Luma([0u8]),
            );
        }
        for &(question, alternative) in marks {
            let bubble = self.bubble(question, alternative);
            draw_filled_circle_mut(
                &mut image,
                (bubble.x() as i32, bubble.y() as i32),
                bubble.radius as i32,
                Luma([0u8]),
            );
        }
        image
    }
}

/// Binarized, inverted copy of a sheet: ink active, paper inactive.
pub(crate) fn ink_mask(sheet: &GrayImage) -> GrayImage {
    let vision = ImageprocVision;
    vision.invert_binary(&vision.binarize(sheet))
}

/// Deterministically shuffles detections so tests never rely on input order.
pub(crate) fn scramble(mut detections: Vec<Detection>) -> Vec<Detection> {
    detections.reverse();
    let (odd, even): (Vec<_>, Vec<_>) = detections
        .into_iter()
        .enumerate()
        .partition(|(i, _)| i % 2 == 1);
    odd.into_iter().chain(even).map(|(_, d)| d).collect()
}
