// THEORY:
// This file is the entry point for the `bubble_grader` library crate.
//
// The public face of the crate is `SheetGrader` in `pipeline`: build it once
// with a layout and an answer key, then hand it sheet images and receive one
// `QuestionResult` per question. The geometric core (`grid_reconstructor`,
// `mark_classifier`, `result_aggregator`) is also exported for callers that run
// their own detector and only need the grid inference and scoring.

pub mod core_modules;
pub mod error;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_utils;

pub use core_modules::circle_detector::CircleDetectionParams;
pub use core_modules::detection::{Detection, DetectionSet};
pub use core_modules::grid_reconstructor::{Grid, grid_reconstructor::reconstruct};
pub use core_modules::layout::{AnswerKey, LayoutConfig};
pub use core_modules::mark_classifier::{DEFAULT_FILL_THRESHOLD_PERCENT, MarkClassifier};
pub use core_modules::result_aggregator::{QuestionResult, ResultAggregator, total_correct};
pub use core_modules::vision::{ImageprocVision, SheetVision};
pub use error::{GradingError, Result};
pub use pipeline::{GraderConfig, GradingReport, SheetDefinition, SheetGrader};
