// THEORY:
// The `pipeline` module is the top-level API of the grader. It wraps the
// stateless core (grid reconstruction, mark classification, aggregation) with
// the image treatment a photographed sheet needs, and returns one report per
// sheet.
//
// The grader keeps nothing between sheets beyond its construction parameters,
// so one `SheetGrader` can grade any number of sheets, from several threads if
// the caller wishes.

use crate::core_modules::circle_detector::CircleDetectionParams;
use crate::core_modules::detection::Detection;
use crate::core_modules::grid_reconstructor::grid_reconstructor;
use crate::core_modules::layout::{AnswerKey, LayoutConfig};
use crate::core_modules::mark_classifier::{DEFAULT_FILL_THRESHOLD_PERCENT, MarkClassifier};
use crate::core_modules::renderer;
use crate::core_modules::result_aggregator::{QuestionResult, ResultAggregator, total_correct};
use crate::core_modules::vision::{ImageprocVision, SheetVision};
use crate::error::Result;
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const DEFAULT_BLUR_SIGMA: f32 = 0.7;

fn default_blur_sigma() -> f32 {
    DEFAULT_BLUR_SIGMA
}

fn default_fill_threshold() -> f64 {
    DEFAULT_FILL_THRESHOLD_PERCENT
}

/// Configuration for the SheetGrader. Everything but the layout has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraderConfig {
    pub layout: LayoutConfig,
    #[serde(default)]
    pub detection: CircleDetectionParams,
    /// Gaussian sigma applied to the binarized sheet before circle detection.
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
    /// A bubble is filled when its ink coverage, in percent, is strictly above this.
    #[serde(default = "default_fill_threshold")]
    pub fill_threshold_percent: f64,
    /// Where debug images go when a sheet is graded with `debug` set.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
}

impl GraderConfig {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            detection: CircleDetectionParams::default(),
            blur_sigma: DEFAULT_BLUR_SIGMA,
            fill_threshold_percent: DEFAULT_FILL_THRESHOLD_PERCENT,
            debug_dir: None,
        }
    }
}

/// A sheet file: grader configuration plus the answer key, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDefinition {
    #[serde(flatten)]
    pub config: GraderConfig,
    pub answer_key: Vec<usize>,
}

impl SheetDefinition {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}

/// The graded sheet: one result per question index, plus the totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingReport {
    pub results: BTreeMap<usize, QuestionResult>,
    pub question_count: usize,
    pub total_correct: usize,
    /// Questions left blank or marked more than once.
    pub unanswered: usize,
}

impl GradingReport {
    pub fn from_results(results: Vec<QuestionResult>) -> Self {
        let question_count = results.len();
        let total_correct = total_correct(&results);
        let unanswered = results.iter().filter(|r| !r.has_mark()).count();
        Self {
            results: results.into_iter().map(|r| (r.question_index, r)).collect(),
            question_count,
            total_correct,
            unanswered,
        }
    }
}

/// The main, top-level struct for grading answer sheets.
pub struct SheetGrader<V: SheetVision = ImageprocVision> {
    config: GraderConfig,
    answer_key: AnswerKey,
    aggregator: ResultAggregator,
    vision: V,
}

impl SheetGrader {
    /// Validates the answer key against the layout before any sheet is graded.
    pub fn new(config: GraderConfig, answer_key: Vec<usize>) -> Result<Self> {
        Self::with_vision(config, answer_key, ImageprocVision)
    }

    pub fn from_definition(definition: SheetDefinition) -> Result<Self> {
        Self::new(definition.config, definition.answer_key)
    }
}

impl<V: SheetVision> SheetGrader<V> {
    /// Same as `new`, with a custom vision backend.
    pub fn with_vision(config: GraderConfig, answer_key: Vec<usize>, vision: V) -> Result<Self> {
        let answer_key = AnswerKey::new(answer_key, &config.layout)?;
        let aggregator = ResultAggregator::new(MarkClassifier::new(config.fill_threshold_percent));
        Ok(Self {
            config,
            answer_key,
            aggregator,
            vision,
        })
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer_key
    }

    pub fn grade_file(&self, path: impl AsRef<Path>, debug: bool) -> Result<GradingReport> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "grading sheet");
        let image = image::open(path)?;
        self.grade_image(&image, debug)
    }

    pub fn grade_image(&self, image: &DynamicImage, debug: bool) -> Result<GradingReport> {
        // Stage 1: Initial Treatment
        let mut gray = self.vision.to_grayscale(image);
        let binary = self.vision.binarize(&gray);
        let smoothed = self.vision.blur(&binary, self.config.blur_sigma);

        // Stage 2: Bubble Detection & Grid Reconstruction
        let detections = self.vision.detect_circles(&smoothed, &self.config.detection);
        tracing::debug!(count = detections.len(), "detected bubble candidates");
        let grid = grid_reconstructor::reconstruct(detections.as_slice(), &self.config.layout)?;

        // Stage 3: Ink Mask (outlines sharpen the bubble borders before re-binarizing)
        self.vision.outline_circles(&mut gray, detections.as_slice());
        let mask = self.vision.invert_binary(&self.vision.binarize(&gray));

        // Stage 4: Classification & Scoring
        let results = self.aggregator.score(&self.vision, &grid, &mask, &self.answer_key)?;

        if debug {
            match &self.config.debug_dir {
                Some(dir) => {
                    renderer::write_debug_images(dir, image, &grid, &results, &self.answer_key)?;
                }
                None => tracing::warn!("debug output requested but no debug directory is configured"),
            }
        }

        let report = GradingReport::from_results(results);
        tracing::info!(
            correct = report.total_correct,
            questions = report.question_count,
            unanswered = report.unanswered,
            "sheet graded"
        );
        Ok(report)
    }

    /// The geometric core alone: grid inference and scoring over detections the
    /// caller already has, against a mask where ink is active.
    pub fn grade_detections(
        &self,
        detections: &[Detection],
        mask: &GrayImage,
    ) -> Result<Vec<QuestionResult>> {
        let grid = grid_reconstructor::reconstruct(detections, &self.config.layout)?;
        self.aggregator.score(&self.vision, &grid, mask, &self.answer_key)
    }
}
