// THEORY:
// The physical sheet is arranged as `column_blocks` side-by-side vertical
// blocks. Each block is a column of questions and each question is a
// horizontal row of `alternatives_per_question` bubbles. Questions are numbered
// block-major: every row of block 0 first, then every row of block 1, and so on.
//
// "Column blocks" and "rows per column block" are easy to confuse with a plain
// rows-by-columns matrix, so they stay distinct named quantities here and are
// never passed around as anonymous matrix dimensions.

use crate::error::{GradingError, Result};
use serde::{Deserialize, Serialize};

/// The expected arrangement of bubbles on a sheet. Immutable once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLayout")]
pub struct LayoutConfig {
    question_count: usize,
    alternatives_per_question: usize,
    column_blocks: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayout {
    question_count: usize,
    alternatives_per_question: usize,
    column_blocks: usize,
}

impl TryFrom<RawLayout> for LayoutConfig {
    type Error = GradingError;

    fn try_from(raw: RawLayout) -> Result<Self> {
        Self::new(
            raw.question_count,
            raw.alternatives_per_question,
            raw.column_blocks,
        )
    }
}

impl LayoutConfig {
    pub fn new(
        question_count: usize,
        alternatives_per_question: usize,
        column_blocks: usize,
    ) -> Result<Self> {
        if question_count == 0 || alternatives_per_question == 0 || column_blocks == 0 {
            return Err(GradingError::InvalidLayoutConfig {
                question_count,
                alternatives_per_question,
                column_blocks,
            });
        }
        Ok(Self {
            question_count,
            alternatives_per_question,
            column_blocks,
        })
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn alternatives_per_question(&self) -> usize {
        self.alternatives_per_question
    }

    pub fn column_blocks(&self) -> usize {
        self.column_blocks
    }

    /// Exact number of bubbles the detector must report for this layout.
    pub fn expected_detections(&self) -> usize {
        self.question_count * self.alternatives_per_question
    }

    /// Rows inside one column block. A block with a remainder gets an extra row.
    pub fn rows_per_column_block(&self) -> usize {
        self.question_count.div_ceil(self.column_blocks)
    }

    /// Size of the topmost row band, which spans every column block.
    pub fn first_band_size(&self) -> usize {
        self.column_blocks * self.alternatives_per_question
    }
}

/// One correct alternative index per question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerKey {
    answers: Vec<usize>,
}

impl AnswerKey {
    /// Validates the key against the layout: one entry per question, each in range.
    pub fn new(answers: Vec<usize>, layout: &LayoutConfig) -> Result<Self> {
        if answers.len() != layout.question_count() {
            return Err(GradingError::InvalidAnswerKey(format!(
                "expected {} answers, got {}",
                layout.question_count(),
                answers.len()
            )));
        }
        if let Some((question, &answer)) = answers
            .iter()
            .enumerate()
            .find(|(_, a)| **a >= layout.alternatives_per_question())
        {
            return Err(GradingError::InvalidAnswerKey(format!(
                "question {question} has answer {answer}, but only {} alternatives exist",
                layout.alternatives_per_question()
            )));
        }
        Ok(Self { answers })
    }

    /// Correct alternative for `question`.
    pub fn correct_alternative(&self, question: usize) -> usize {
        self.answers[question]
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.answers
    }
}
