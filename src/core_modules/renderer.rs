// THEORY:
// Debug visualization of a graded sheet. Nothing here feeds back into grading:
// the renderer reads the grid and the results and paints three pictures.
//
// 1.  **Confirmation Card**: what the grader believes was marked. Every bubble is
//     a white outline on black, the recognised mark is filled in, and a strip
//     below the card carries a bar whose length is the share of correct answers.
// 2.  **Answer Key Card**: the same bubbles with the correct alternatives filled.
// 3.  **Detection Overlay**: the original photo with each detected circle outlined
//     in green, for checking the detector itself.

use crate::core_modules::detection::Detection;
use crate::core_modules::grid_reconstructor::Grid;
use crate::core_modules::layout::AnswerKey;
use crate::core_modules::result_aggregator::{QuestionResult, total_correct};
use crate::error::Result;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

const SCORE_STRIP_HEIGHT: u32 = 30;
const WHITE: Luma<u8> = Luma([255]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

pub const CONFIRMATION_CARD_FILE: &str = "confirmation_card.png";
pub const ANSWER_KEY_CARD_FILE: &str = "answer_key_card.png";
pub const DETECTION_OVERLAY_FILE: &str = "detection_overlay.png";

fn center(detection: &Detection) -> (i32, i32) {
    (detection.x() as i32, detection.y() as i32)
}

/// Paints every bubble of `grid`, filling the one `filled(question)` selects.
fn draw_card(canvas: &mut GrayImage, grid: &Grid<'_>, filled: impl Fn(usize) -> Option<usize>) {
    for question in 0..grid.question_count() {
        let chosen = filled(question);
        for (alternative, bubble) in grid.alternatives(question).enumerate() {
            if chosen == Some(alternative) {
                draw_filled_circle_mut(canvas, center(bubble), bubble.radius as i32, WHITE);
            } else {
                draw_hollow_circle_mut(canvas, center(bubble), bubble.radius as i32, WHITE);
            }
        }
    }
}

/// The count the score bar stands for, e.g. `correct: 3/4`.
pub fn score_line(results: &[QuestionResult]) -> String {
    format!("correct: {}/{}", total_correct(results), results.len())
}

/// Card showing the recognised marks plus a score bar underneath.
pub fn confirmation_card(
    (width, height): (u32, u32),
    grid: &Grid<'_>,
    results: &[QuestionResult],
) -> GrayImage {
    let mut card = GrayImage::new(width, height + SCORE_STRIP_HEIGHT);
    draw_card(&mut card, grid, |question| {
        results.get(question).and_then(|r| r.marked_alternative)
    });

    if !results.is_empty() {
        let usable = width.saturating_sub(10);
        let bar = usable * total_correct(results) as u32 / results.len() as u32;
        if bar > 0 {
            draw_filled_rect_mut(&mut card, Rect::at(5, (height + 10) as i32).of_size(bar, 10), WHITE);
        }
    }
    card
}

/// Card showing the correct alternative of every question.
pub fn answer_key_card((width, height): (u32, u32), grid: &Grid<'_>, key: &AnswerKey) -> GrayImage {
    let mut card = GrayImage::new(width, height);
    draw_card(&mut card, grid, |question| Some(key.correct_alternative(question)));
    card
}

/// The original sheet with every detection outlined in green.
pub fn detection_overlay(original: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut overlay = original.to_rgb8();
    for detection in detections {
        draw_hollow_circle_mut(&mut overlay, center(detection), detection.radius as i32, GREEN);
    }
    overlay
}

/// Writes the three debug images into `dir`, creating it when missing.
pub fn write_debug_images(
    dir: &Path,
    original: &DynamicImage,
    grid: &Grid<'_>,
    results: &[QuestionResult],
    key: &AnswerKey,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let size = (original.width(), original.height());

    let confirmation = dir.join(CONFIRMATION_CARD_FILE);
    confirmation_card(size, grid, results).save(&confirmation)?;

    let answer_key = dir.join(ANSWER_KEY_CARD_FILE);
    answer_key_card(size, grid, key).save(&answer_key)?;

    let overlay = dir.join(DETECTION_OVERLAY_FILE);
    detection_overlay(original, grid.detections()).save(&overlay)?;

    tracing::info!(dir = %dir.display(), score = %score_line(results), "wrote debug images");
    Ok(vec![confirmation, answer_key, overlay])
}
