// THEORY:
// The `MarkClassifier` decides whether a single bubble is filled in. It looks at
// the bubble's enclosing square on the ink mask (ink pixels active, paper
// inactive) and compares the share of active pixels with a threshold.
//
// The percentage is rounded to two decimals before the strict `>` comparison,
// so 55.004 % is "55.00 %" and does not count as filled at a 55 % threshold.
// Rounding is done exactly in integer hundredths, half to even, so no floating
// point error can flip a bubble sitting right at the boundary.

use crate::core_modules::detection::Detection;
use crate::core_modules::vision::SheetVision;
use crate::error::{GradingError, Result};
use image::GrayImage;
use imageproc::rect::Rect;

pub const DEFAULT_FILL_THRESHOLD_PERCENT: f64 = 55.0;

/// Axis-aligned square enclosing a bubble. May reach past the sheet edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleSquare {
    pub x: i64,
    pub y: i64,
    pub side: i64,
}

impl BubbleSquare {
    /// `center - radius` truncated to whole pixels, with a side of `2 * radius + 1`.
    pub fn enclosing(detection: &Detection) -> Self {
        let radius = detection.radius;
        Self {
            x: (detection.x() - radius) as i64,
            y: (detection.y() - radius) as i64,
            side: (radius as i64).saturating_mul(2).saturating_add(1),
        }
    }

    /// The part of the square lying on a `width` x `height` image, if any.
    pub fn clip(&self, width: u32, height: u32) -> Option<Rect> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.x.saturating_add(self.side).min(width as i64);
        let bottom = self.y.saturating_add(self.side).min(height as i64);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32))
    }
}

/// Classifies bubbles as filled or empty by their ink coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkClassifier {
    threshold_percent: f64,
}

impl Default for MarkClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FILL_THRESHOLD_PERCENT)
    }
}

impl MarkClassifier {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    /// Ink coverage of the bubble's square, as a percentage rounded to two decimals.
    pub fn fill_percentage<V: SheetVision + ?Sized>(
        &self,
        vision: &V,
        region: &Detection,
        mask: &GrayImage,
    ) -> Result<f64> {
        let square = BubbleSquare::enclosing(region);
        let out_of_bounds = GradingError::RegionOutOfBounds {
            x: square.x,
            y: square.y,
            side: square.side,
        };
        let finite = region.x().is_finite() && region.y().is_finite() && region.radius.is_finite();
        if !finite {
            return Err(out_of_bounds);
        }
        let (width, height) = mask.dimensions();
        let rect = square.clip(width, height).ok_or(out_of_bounds)?;

        let active = vision.count_active_pixels(mask, rect) as u64;
        let area = rect.width() as u64 * rect.height() as u64;
        Ok(rounded_percentage(active, area))
    }

    pub fn is_filled<V: SheetVision + ?Sized>(
        &self,
        vision: &V,
        region: &Detection,
        mask: &GrayImage,
    ) -> Result<bool> {
        Ok(self.fill_percentage(vision, region, mask)? > self.threshold_percent)
    }
}

/// `active / area * 100` rounded half-to-even at the second decimal.
fn rounded_percentage(active: u64, area: u64) -> f64 {
    let scaled = active * 10_000;
    let mut hundredths = scaled / area;
    let remainder = scaled % area;
    if remainder * 2 > area || (remainder * 2 == area && hundredths % 2 == 1) {
        hundredths += 1;
    }
    hundredths as f64 / 100.0
}
