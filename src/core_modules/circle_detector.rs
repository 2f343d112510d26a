// THEORY:
// A small Hough-gradient circle detector, enough to find printed answer bubbles.
//
// Algorithm steps:
// 1.  **Edge Extraction**: Canny edges mark candidate circle boundaries; Sobel
//     gradients on a lightly smoothed copy give each edge pixel a normal.
// 2.  **Center Voting**: Every edge pixel votes for centers lying along its normal,
//     in both directions, at every distance in `[min_radius, max_radius]`.
// 3.  **Peak Finding**: Local maxima of the vote map above the accumulator
//     threshold become candidate centers, strongest first.
// 4.  **Suppression & Radius**: A candidate closer than `min_distance` to an
//     accepted circle is dropped. Otherwise the radius with the most supporting
//     edge pixels is chosen, and it must itself reach the threshold.
//
// Output is sorted top to bottom, the order the grid reconstructor starts from.

use crate::core_modules::detection::{Detection, DetectionSet};
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use serde::{Deserialize, Serialize};

const GRADIENT_SMOOTHING_SIGMA: f32 = 1.0;

/// Tuning knobs for bubble detection. Defaults suit bubbles of roughly 20 px diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleDetectionParams {
    /// Smallest radius considered, in pixels.
    pub min_radius: u32,
    /// Largest radius considered, in pixels.
    pub max_radius: u32,
    /// Upper Canny threshold; the lower one is half of it.
    pub canny_threshold: f32,
    /// Minimum votes for a center and minimum edge support for its radius.
    pub accumulator_threshold: u32,
    /// Minimum distance between two accepted centers, in pixels.
    pub min_distance: f32,
}

impl Default for CircleDetectionParams {
    fn default() -> Self {
        Self {
            min_radius: 9,
            max_radius: 12,
            canny_threshold: 12.0,
            accumulator_threshold: 13,
            min_distance: 22.0,
        }
    }
}

pub fn detect_circles(image: &GrayImage, params: &CircleDetectionParams) -> DetectionSet {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 || params.max_radius < params.min_radius {
        return DetectionSet::default();
    }

    // --- 1. Edge Extraction ---
    let edges = canny(image, params.canny_threshold / 2.0, params.canny_threshold);
    let smoothed = imageproc::filter::gaussian_blur_f32(image, GRADIENT_SMOOTHING_SIGMA);
    let gx = horizontal_sobel(&smoothed);
    let gy = vertical_sobel(&smoothed);

    // --- 2. Center Voting ---
    let mut votes = vec![0u32; (width * height) as usize];
    for (x, y, edge) in edges.enumerate_pixels() {
        if edge[0] == 0 {
            continue;
        }
        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude < f32::EPSILON {
            continue;
        }
        let (ux, uy) = (dx / magnitude, dy / magnitude);

        for radius in params.min_radius..=params.max_radius {
            for direction in [-1.0f32, 1.0] {
                let step = direction * radius as f32;
                let cx = (x as f32 + ux * step).round();
                let cy = (y as f32 + uy * step).round();
                if cx >= 0.0 && cy >= 0.0 && (cx as u32) < width && (cy as u32) < height {
                    votes[(cy as u32 * width + cx as u32) as usize] += 1;
                }
            }
        }
    }

    // --- 3. Peak Finding ---
    let mut peaks: Vec<(u32, u32, u32)> = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let count = votes[(y * width + x) as usize];
            if count < params.accumulator_threshold {
                continue;
            }
            let is_peak = (-1i32..=1).all(|oy| {
                (-1i32..=1).all(|ox| {
                    let ny = (y as i32 + oy) as u32;
                    let nx = (x as i32 + ox) as u32;
                    votes[(ny * width + nx) as usize] <= count
                })
            });
            if is_peak {
                peaks.push((x, y, count));
            }
        }
    }
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    // --- 4. Suppression & Radius ---
    let mut circles: Vec<Detection> = Vec::new();
    for (x, y, _) in peaks {
        let (cx, cy) = (x as f32, y as f32);
        let too_close = circles.iter().any(|c| {
            let (ddx, ddy) = (c.x() - cx, c.y() - cy);
            (ddx * ddx + ddy * ddy).sqrt() < params.min_distance
        });
        if too_close {
            continue;
        }
        if let Some(radius) = estimate_radius(&edges, x, y, params) {
            circles.push(Detection::new(cx, cy, radius));
        }
    }

    circles.sort_by(|a, b| a.y().total_cmp(&b.y()));
    tracing::debug!(count = circles.len(), "circle detection finished");
    DetectionSet::new(circles)
}

/// Picks the radius with the most edge pixels at that distance from the center.
fn estimate_radius(
    edges: &GrayImage,
    cx: u32,
    cy: u32,
    params: &CircleDetectionParams,
) -> Option<f32> {
    let bins = (params.max_radius - params.min_radius + 1) as usize;
    let mut support = vec![0u32; bins];
    let mut distance_sums = vec![0f32; bins];

    let reach = params.max_radius + 1;
    let (width, height) = edges.dimensions();
    for y in cy.saturating_sub(reach)..(cy + reach + 1).min(height) {
        for x in cx.saturating_sub(reach)..(cx + reach + 1).min(width) {
            if edges.get_pixel(x, y)[0] == 0 {
                continue;
            }
            let dx = x as f32 - cx as f32;
            let dy = y as f32 - cy as f32;
            let distance = (dx * dx + dy * dy).sqrt();
            let bin = distance.round() as u32;
            if bin < params.min_radius || bin > params.max_radius {
                continue;
            }
            let index = (bin - params.min_radius) as usize;
            support[index] += 1;
            distance_sums[index] += distance;
        }
    }

    let (best, &count) = support.iter().enumerate().max_by_key(|(_, count)| **count)?;
    if count < params.accumulator_threshold {
        return None;
    }
    Some(distance_sums[best] / count as f32)
}
