// THEORY:
// The grader only needs a handful of pixel-level primitives from a vision
// library: grayscale conversion, automatic binarization, blurring, circle
// detection, inversion and counting active pixels. `SheetVision` names exactly
// that set so the geometric core never depends on how they are computed.
//
// Every method has a default built on `image` + `imageproc`, so
// `ImageprocVision` is an empty struct. An implementor can override a single
// step (tests replace `detect_circles` with a fixed list) and keep the rest.

use crate::core_modules::circle_detector::{self, CircleDetectionParams};
use crate::core_modules::detection::{Detection, DetectionSet};
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::drawing::draw_hollow_circle_mut;
use imageproc::rect::Rect;

/// The pixel-level operations the grading pipeline relies on.
pub trait SheetVision: Send + Sync {
    fn to_grayscale(&self, image: &DynamicImage) -> GrayImage {
        image.to_luma8()
    }

    /// Two-level image using an automatically chosen (Otsu) threshold.
    /// Background and ink end up at 255 and 0 respectively.
    fn binarize(&self, image: &GrayImage) -> GrayImage {
        let level = otsu_level(image);
        threshold(image, level, ThresholdType::Binary)
    }

    fn blur(&self, image: &GrayImage, sigma: f32) -> GrayImage {
        if sigma <= 0.0 {
            return image.clone();
        }
        imageproc::filter::gaussian_blur_f32(image, sigma)
    }

    fn detect_circles(&self, image: &GrayImage, params: &CircleDetectionParams) -> DetectionSet {
        circle_detector::detect_circles(image, params)
    }

    fn invert_binary(&self, image: &GrayImage) -> GrayImage {
        let mut inverted = image.clone();
        image::imageops::invert(&mut inverted);
        inverted
    }

    /// Number of non-zero pixels of `mask` inside `region`.
    fn count_active_pixels(&self, mask: &GrayImage, region: Rect) -> u32 {
        let view = image::imageops::crop_imm(
            mask,
            region.left().max(0) as u32,
            region.top().max(0) as u32,
            region.width(),
            region.height(),
        );
        view.pixels().filter(|(_, _, pixel)| pixel[0] != 0).count() as u32
    }

    /// Draws every detection as a thin black outline, sharpening bubble borders
    /// before the ink mask is built.
    fn outline_circles(&self, image: &mut GrayImage, detections: &[Detection]) {
        for detection in detections {
            draw_hollow_circle_mut(
                image,
                (detection.x() as i32, detection.y() as i32),
                detection.radius as i32,
                Luma([0u8]),
            );
        }
    }
}

/// Default vision backend built on `image` and `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocVision;

impl SheetVision for ImageprocVision {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binarize_then_invert_marks_ink_active() {
        let mut image = GrayImage::from_pixel(10, 10, Luma([230u8]));
        for x in 0..5 {
            image.put_pixel(x, 0, Luma([20u8]));
        }
        let vision = ImageprocVision;
        let mask = vision.invert_binary(&vision.binarize(&image));

        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(9, 9)[0], 0);
        let all = Rect::at(0, 0).of_size(10, 10);
        assert_eq!(vision.count_active_pixels(&mask, all), 5);
    }

    #[test]
    fn counts_only_inside_the_region() {
        let mut mask = GrayImage::new(20, 20);
        for y in 0..20 {
            for x in 0..20 {
                if x >= 10 {
                    mask.put_pixel(x, y, Luma([255u8]));
                }
            }
        }
        let vision = ImageprocVision;
        assert_eq!(vision.count_active_pixels(&mask, Rect::at(5, 0).of_size(10, 2)), 10);
        assert_eq!(vision.count_active_pixels(&mask, Rect::at(0, 0).of_size(10, 20)), 0);
    }

    #[test]
    fn outlines_are_drawn_in_black() {
        let mut image = GrayImage::from_pixel(40, 40, Luma([255u8]));
        let vision = ImageprocVision;
        vision.outline_circles(&mut image, &[Detection::new(20.0, 20.0, 10.0)]);

        assert_eq!(image.get_pixel(30, 20)[0], 0);
        assert_eq!(image.get_pixel(20, 20)[0], 255);
    }
}
