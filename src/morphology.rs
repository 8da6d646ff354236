//! Shape descriptors of the dominant contour in an image.
//!
//! The analyzer binarizes the image with Canny edge detection, traces external
//! contours and measures the single largest one. Cassava leaves show up here
//! as irregular, lobed outlines; entire (unlobed) leaves and man-made objects
//! produce compact, convex ones.

use image::RgbImage;
use imageproc::contours::{find_contours, Contour};
use imageproc::edges::canny;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Canny hysteresis thresholds on the 8-bit intensity scale.
pub const CANNY_LOW: f32 = 100.0;
pub const CANNY_HIGH: f32 = 200.0;

/// Hull-perimeter to contour-perimeter ratio above which a shape counts as lobed.
pub const LOBED_RATIO_THRESHOLD: f64 = 1.2;
/// Compactness above which a shape counts as palmate.
pub const PALMATE_COMPACTNESS_THRESHOLD: f64 = 15.0;

/// Shape report for the largest external contour of an image.
///
/// All fields derive from exactly one contour. When no contour exists (for
/// example a uniform image with no edges) the analyzer returns `None` rather
/// than a zeroed report, so downstream scoring never mistakes "no shape" for
/// "a degenerate shape".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphologyReport {
    /// Enclosed area of the contour, in pixels.
    pub area: f64,
    /// Closed contour perimeter, in pixels.
    pub perimeter: f64,
    /// `perimeter^2 / (4*pi*area)`; 1.0 for a circle, larger for irregular shapes.
    pub compactness: f64,
    /// Width / height of the axis-aligned bounding box.
    pub aspect_ratio: f64,
    /// Contour area / convex hull area, in `(0, 1]` for non-degenerate shapes.
    pub solidity: f64,
    /// Convex hull perimeter / contour perimeter.
    pub lobe_ratio: f64,
    /// Bounding box (width, height) in pixels.
    pub bounding_box: (u32, u32),
    pub is_lobed: bool,
    pub is_palmate: bool,
}

/// Extract shape descriptors from the dominant contour of `image`.
///
/// Returns `None` when edge detection finds no contour at all, which signals
/// "no distinguishable subject" rather than a failure.
pub fn analyze(image: &RgbImage) -> Option<MorphologyReport> {
    let gray = image::imageops::grayscale(image);

    // Canny needs a few pixels of context for its gradient window; anything
    // smaller cannot contain a distinguishable shape anyway.
    if gray.width() < 5 || gray.height() < 5 {
        return None;
    }

    let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);
    let contours: Vec<Contour<i32>> = find_contours(&edges);

    let main_contour = contours
        .iter()
        .filter(|c| c.parent.is_none())
        .max_by(|a, b| {
            contour_area(&a.points)
                .partial_cmp(&contour_area(&b.points))
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

    Some(report_for_points(&main_contour.points))
}

/// Measure a contour given as an ordered point list. Exposed within the crate
/// so the region extractor can reuse the same geometry on mask contours.
pub(crate) fn report_for_points(points: &[Point<i32>]) -> MorphologyReport {
    let area = contour_area(points);
    let perimeter = contour_perimeter(points);

    let compactness = if area > 0.0 {
        perimeter.powi(2) / (4.0 * std::f64::consts::PI * area)
    } else {
        0.0
    };

    let (bb_w, bb_h) = bounding_box(points);
    let aspect_ratio = if bb_h > 0 {
        f64::from(bb_w) / f64::from(bb_h)
    } else {
        0.0
    };

    let hull = convex_hull(points.to_vec());
    let hull_area = contour_area(&hull);
    let solidity = if hull_area > 0.0 { area / hull_area } else { 0.0 };

    let hull_perimeter = contour_perimeter(&hull);
    let lobe_ratio = if perimeter > 0.0 {
        hull_perimeter / perimeter
    } else {
        0.0
    };

    MorphologyReport {
        area,
        perimeter,
        compactness,
        aspect_ratio,
        solidity,
        lobe_ratio,
        bounding_box: (bb_w, bb_h),
        is_lobed: lobe_ratio > LOBED_RATIO_THRESHOLD,
        is_palmate: compactness > PALMATE_COMPACTNESS_THRESHOLD,
    }
}

/// Enclosed area of a closed polygon via the shoelace formula.
pub(crate) fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        acc += f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
    }
    acc.abs() / 2.0
}

/// Length of the closed polyline through `points`.
pub(crate) fn contour_perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        let dx = f64::from(p.x - q.x);
        let dy = f64::from(p.y - q.y);
        acc += (dx * dx + dy * dy).sqrt();
    }
    acc
}

/// Axis-aligned bounding box of a point set, as (width, height) in pixels.
pub(crate) fn bounding_box(points: &[Point<i32>]) -> (u32, u32) {
    if points.is_empty() {
        return (0, 0);
    }
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);
    ((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32)
}
