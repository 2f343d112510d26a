// THEORY:
// Every failure in the grader aborts the current sheet. A sheet that cannot be
// graded must never look like a sheet with no ink on it, so nothing here is
// folded into an empty result. Each variant carries the numbers a caller needs
// to tell a detector-parameter problem apart from a layout mis-configuration.

use thiserror::Error;

/// Errors produced while configuring the grader or grading a single sheet.
#[derive(Debug, Error)]
pub enum GradingError {
    #[error(
        "invalid layout: {question_count} questions, {alternatives_per_question} alternatives, \
         {column_blocks} column blocks (all must be positive)"
    )]
    InvalidLayoutConfig {
        question_count: usize,
        alternatives_per_question: usize,
        column_blocks: usize,
    },

    #[error("invalid answer key: {0}")]
    InvalidAnswerKey(String),

    /// The detector found a different number of bubbles than the layout expects.
    #[error("detected {found} bubbles but the layout expects exactly {expected}")]
    DetectionCountMismatch { expected: usize, found: usize },

    /// Row banding ran out of detections before every row was formed.
    #[error("ran out of detections after forming {formed} of {expected} rows")]
    InsufficientBands { formed: usize, expected: usize },

    /// A row band is too short to hold the alternatives of one of its questions.
    #[error(
        "row {band} holds {found} bubbles but question {question} needs the first {needed}"
    )]
    BandUnderfilled {
        band: usize,
        question: usize,
        needed: usize,
        found: usize,
    },

    /// A bubble's bounding square does not overlap the mask at all.
    #[error("bubble square at ({x}, {y}) with side {side} lies outside the sheet")]
    RegionOutOfBounds { x: i64, y: i64, side: i64 },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GradingError>;
