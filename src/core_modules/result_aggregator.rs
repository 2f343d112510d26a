// THEORY:
// The `ResultAggregator` walks the reconstructed grid question by question,
// classifies every bubble, and turns the marks into one `QuestionResult` each.
//
// Per question, alternatives are scanned left to right:
// - the first filled bubble is recorded and scanning continues, since a later
//   mark in the same question must still be caught;
// - a second filled bubble clears the answer and ends the scan, because the
//   question is already invalid whatever follows.
// A question with no mark and a question with several marks both end up with no
// marked alternative. Neither is an error; they are ordinary outcomes.
//
// The aggregator only reads the grid, the mask and the key, and builds a fresh
// result list on every call.

use crate::core_modules::grid_reconstructor::Grid;
use crate::core_modules::layout::AnswerKey;
use crate::core_modules::mark_classifier::MarkClassifier;
use crate::core_modules::vision::SheetVision;
use crate::error::{GradingError, Result};
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// The outcome for one question of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_index: usize,
    pub correct_alternative: usize,
    /// `None` when nothing was marked or when more than one bubble was marked.
    pub marked_alternative: Option<usize>,
}

impl QuestionResult {
    pub fn new(question_index: usize, correct_alternative: usize) -> Self {
        Self {
            question_index,
            correct_alternative,
            marked_alternative: None,
        }
    }

    pub fn has_mark(&self) -> bool {
        self.marked_alternative.is_some()
    }

    pub fn is_correct(&self) -> bool {
        self.marked_alternative == Some(self.correct_alternative)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator {
    classifier: MarkClassifier,
}

impl ResultAggregator {
    pub fn new(classifier: MarkClassifier) -> Self {
        Self { classifier }
    }

    /// Classifies every bubble of `grid` against `mask` and scores it with `answer_key`.
    pub fn score<V: SheetVision + ?Sized>(
        &self,
        vision: &V,
        grid: &Grid<'_>,
        mask: &GrayImage,
        answer_key: &AnswerKey,
    ) -> Result<Vec<QuestionResult>> {
        if answer_key.len() != grid.question_count() {
            return Err(GradingError::InvalidAnswerKey(format!(
                "key has {} answers but the grid has {} questions",
                answer_key.len(),
                grid.question_count()
            )));
        }

        let mut results = Vec::with_capacity(grid.question_count());
        for question in 0..grid.question_count() {
            let mut result = QuestionResult::new(question, answer_key.correct_alternative(question));

            let mut saw_one_mark = false;
            for (alternative, region) in grid.alternatives(question).enumerate() {
                if !self.classifier.is_filled(vision, region, mask)? {
                    continue;
                }
                if saw_one_mark {
                    tracing::debug!(question, alternative, "several alternatives marked");
                    result.marked_alternative = None;
                    break;
                }
                result.marked_alternative = Some(alternative);
                saw_one_mark = true;
            }

            results.push(result);
        }

        Ok(results)
    }
}

/// Number of questions answered with exactly the correct alternative.
pub fn total_correct(results: &[QuestionResult]) -> usize {
    results.iter().filter(|r| r.is_correct()).count()
}
