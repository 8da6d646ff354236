//! Gray-level co-occurrence matrix texture descriptors.
//!
//! 256 intensity levels, unit pixel offset, four sampling angles (0, 45, 90,
//! 135 degrees), symmetric and normalized. The five scalar properties are each
//! averaged over the four angles.

use image::GrayImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub const LEVELS: usize = 256;

/// Neutral value substituted for every property when the computation is
/// disabled or the image has no co-occurring pixel pairs.
pub const NEUTRAL: f64 = 0.5;

/// (row, column) offsets for the four sampling angles at unit distance.
const OFFSETS: [(i64, i64); 4] = [(0, 1), (-1, 1), (-1, 0), (-1, -1)];

/// The five co-occurrence-derived scalars, averaged over four angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlcmFeatures {
    pub contrast: f64,
    pub dissimilarity: f64,
    pub homogeneity: f64,
    pub energy: f64,
    pub correlation: f64,
}

impl GlcmFeatures {
    /// The documented fallback when co-occurrence computation is unavailable.
    pub const fn neutral() -> Self {
        Self {
            contrast: NEUTRAL,
            dissimilarity: NEUTRAL,
            homogeneity: NEUTRAL,
            energy: NEUTRAL,
            correlation: NEUTRAL,
        }
    }
}

/// Compute the angle-averaged GLCM properties of a grayscale image.
///
/// Images too small to contain a single pixel pair in some direction simply
/// contribute the neutral value for that angle.
pub fn features(gray: &GrayImage) -> GlcmFeatures {
    let mut sums = [0.0f64; 5];
    for (dr, dc) in OFFSETS {
        let matrix = cooccurrence(gray, dr, dc);
        let props = properties(&matrix);
        sums[0] += props.contrast;
        sums[1] += props.dissimilarity;
        sums[2] += props.homogeneity;
        sums[3] += props.energy;
        sums[4] += props.correlation;
    }

    let n = OFFSETS.len() as f64;
    GlcmFeatures {
        contrast: sums[0] / n,
        dissimilarity: sums[1] / n,
        homogeneity: sums[2] / n,
        energy: sums[3] / n,
        correlation: sums[4] / n,
    }
}

/// Build the symmetric, normalized co-occurrence matrix for one offset.
pub(crate) fn cooccurrence(gray: &GrayImage, dr: i64, dc: i64) -> Array2<f64> {
    let (width, height) = (i64::from(gray.width()), i64::from(gray.height()));
    let mut matrix = Array2::<f64>::zeros((LEVELS, LEVELS));
    let mut total = 0.0f64;

    for row in 0..height {
        for col in 0..width {
            let nr = row + dr;
            let nc = col + dc;
            if nr < 0 || nr >= height || nc < 0 || nc >= width {
                continue;
            }
            let i = gray.get_pixel(col as u32, row as u32).0[0] as usize;
            let j = gray.get_pixel(nc as u32, nr as u32).0[0] as usize;
            matrix[(i, j)] += 1.0;
            matrix[(j, i)] += 1.0;
            total += 2.0;
        }
    }

    if total > 0.0 {
        matrix.mapv_inplace(|v| v / total);
    }
    matrix
}

/// Derive the five scalar properties from one normalized matrix.
pub(crate) fn properties(matrix: &Array2<f64>) -> GlcmFeatures {
    let mut contrast = 0.0;
    let mut dissimilarity = 0.0;
    let mut homogeneity = 0.0;
    let mut asm = 0.0;
    let mut total = 0.0;

    // Marginal means and variances for the correlation term.
    let mut mean_i = 0.0;
    let mut mean_j = 0.0;

    for ((i, j), &p) in matrix.indexed_iter() {
        if p == 0.0 {
            continue;
        }
        let d = i as f64 - j as f64;
        contrast += p * d * d;
        dissimilarity += p * d.abs();
        homogeneity += p / (1.0 + d * d);
        asm += p * p;
        mean_i += p * i as f64;
        mean_j += p * j as f64;
        total += p;
    }

    if total == 0.0 {
        return GlcmFeatures::neutral();
    }

    let mut var_i = 0.0;
    let mut var_j = 0.0;
    let mut covariance = 0.0;
    for ((i, j), &p) in matrix.indexed_iter() {
        if p == 0.0 {
            continue;
        }
        let di = i as f64 - mean_i;
        let dj = j as f64 - mean_j;
        var_i += p * di * di;
        var_j += p * dj * dj;
        covariance += p * di * dj;
    }

    // A constant image has zero marginal variance; correlation is defined
    // as 1 in that case, matching the co-occurrence literature.
    let denom = (var_i * var_j).sqrt();
    let correlation = if denom > 0.0 { covariance / denom } else { 1.0 };

    GlcmFeatures {
        contrast,
        dissimilarity,
        homogeneity,
        energy: asm.sqrt(),
        correlation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn two_column_image() -> GrayImage {
        // [[0, 1],
        //  [0, 1]]
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(1, 0, Luma([1]));
        img.put_pixel(1, 1, Luma([1]));
        img
    }

    #[test]
    fn test_horizontal_offset_hand_computed() {
        let img = two_column_image();
        let props = properties(&cooccurrence(&img, 0, 1));

        // Two (0,1) pairs, symmetrized: P(0,1) = P(1,0) = 0.5.
        assert!(close(props.contrast, 1.0));
        assert!(close(props.dissimilarity, 1.0));
        assert!(close(props.homogeneity, 0.5));
        assert!(close(props.energy, 0.5f64.sqrt()));
        assert!(close(props.correlation, -1.0));
    }

    #[test]
    fn test_vertical_offset_hand_computed() {
        let img = two_column_image();
        let props = properties(&cooccurrence(&img, -1, 0));

        // Vertical neighbors are equal: P(0,0) = P(1,1) = 0.5.
        assert!(close(props.contrast, 0.0));
        assert!(close(props.homogeneity, 1.0));
        assert!(close(props.correlation, 1.0));
    }

    #[test]
    fn test_angle_average() {
        let img = two_column_image();
        let feats = features(&img);

        // Per-angle contrasts are 1 (0 deg), 1 (45), 0 (90), 1 (135).
        assert!(close(feats.contrast, 0.75));
    }

    #[test]
    fn test_constant_image() {
        let img = GrayImage::from_pixel(8, 8, Luma([200]));
        let feats = features(&img);

        assert!(close(feats.contrast, 0.0));
        assert!(close(feats.dissimilarity, 0.0));
        assert!(close(feats.homogeneity, 1.0));
        assert!(close(feats.energy, 1.0));
        assert!(close(feats.correlation, 1.0));
    }

    #[test]
    fn test_single_pixel_is_neutral() {
        let img = GrayImage::from_pixel(1, 1, Luma([42]));
        let feats = features(&img);

        assert!(close(feats.contrast, NEUTRAL));
        assert!(close(feats.energy, NEUTRAL));
    }
}
