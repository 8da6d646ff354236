//! Texture descriptors: co-occurrence statistics, edge density and a
//! local-variance complexity measure.

use image::{GrayImage, RgbImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::glcm::{self, GlcmFeatures};
use crate::morphology::{CANNY_HIGH, CANNY_LOW};

/// Side length of the uniform averaging window for the local-variance field.
const VARIANCE_WINDOW: usize = 5;

/// Texture report over the full image region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureReport {
    pub glcm: GlcmFeatures,
    /// Fraction of pixels marked by edge detection, in `[0, 1]`.
    pub edge_density: f64,
    /// Standard deviation of the 5x5 local-variance field.
    pub texture_complexity: f64,
}

impl TextureReport {
    /// Contrast, read as surface roughness by the classifier.
    pub fn texture_roughness(&self) -> f64 {
        self.glcm.contrast
    }

    /// Homogeneity, read as surface smoothness.
    pub fn surface_smoothness(&self) -> f64 {
        self.glcm.homogeneity
    }
}

/// Extract texture descriptors from `image`.
///
/// When `glcm_enabled` is false the five co-occurrence scalars take the
/// neutral fallback value; edge density and local-variance complexity depend
/// only on always-available primitives and compute either way, so disabling
/// the co-occurrence step never perturbs them.
pub fn analyze(image: &RgbImage, glcm_enabled: bool) -> TextureReport {
    let gray = image::imageops::grayscale(image);

    let glcm = if glcm_enabled {
        glcm::features(&gray)
    } else {
        warn!("co-occurrence computation disabled, substituting neutral texture values");
        GlcmFeatures::neutral()
    };

    TextureReport {
        glcm,
        edge_density: edge_density(&gray),
        texture_complexity: texture_complexity(&gray),
    }
}

/// Fraction of pixels the Canny detector marks as edges.
fn edge_density(gray: &GrayImage) -> f64 {
    // Same minimum-size guard as the morphology analyzer: the edge detector
    // needs a few pixels of gradient context.
    if gray.width() < 5 || gray.height() < 5 {
        return 0.0;
    }
    let edges = imageproc::edges::canny(gray, CANNY_LOW, CANNY_HIGH);
    let edge_pixels = edges.pixels().filter(|p| p.0[0] > 0).count();
    edge_pixels as f64 / (f64::from(gray.width()) * f64::from(gray.height()))
}

/// Standard deviation of the local-variance field.
///
/// The field is built with two passes of a uniform 5x5 averaging window:
/// first a local mean, then the local mean of squared deviations.
fn texture_complexity(gray: &GrayImage) -> f64 {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    if width == 0 || height == 0 {
        return 0.0;
    }

    let field = Array2::from_shape_fn((height, width), |(r, c)| {
        f64::from(gray.get_pixel(c as u32, r as u32).0[0])
    });

    let local_mean = box_mean(&field);
    let squared_dev = Array2::from_shape_fn((height, width), |idx| {
        let d = field[idx] - local_mean[idx];
        d * d
    });
    let local_var = box_mean(&squared_dev);

    let n = (width * height) as f64;
    let mean = local_var.sum() / n;
    let variance = local_var.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    variance.sqrt()
}

/// Uniform averaging filter with clamped borders, applied separably.
fn box_mean(field: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = field.dim();
    let radius = (VARIANCE_WINDOW / 2) as i64;
    let window = VARIANCE_WINDOW as f64;

    let mut horizontal = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.0;
            for k in -radius..=radius {
                let cc = (c as i64 + k).clamp(0, cols as i64 - 1) as usize;
                acc += field[(r, cc)];
            }
            horizontal[(r, c)] = acc / window;
        }
    }

    let mut out = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.0;
            for k in -radius..=radius {
                let rr = (r as i64 + k).clamp(0, rows as i64 - 1) as usize;
                acc += horizontal[(rr, c)];
            }
            out[(r, c)] = acc / window;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_uniform_image() {
        let image = RgbImage::from_pixel(64, 64, Rgb([90, 90, 90]));
        let report = analyze(&image, true);

        assert_eq!(report.edge_density, 0.0);
        assert!((report.texture_complexity - 0.0).abs() < 1e-9);
        assert!((report.glcm.contrast - 0.0).abs() < 1e-9);
        assert!((report.glcm.energy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_glcm_only_changes_glcm_scalars() {
        let mut image = RgbImage::from_pixel(80, 80, Rgb([255, 255, 255]));
        for y in 20..60 {
            for x in 20..60 {
                image.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }

        let enabled = analyze(&image, true);
        let disabled = analyze(&image, false);

        assert_eq!(enabled.edge_density, disabled.edge_density);
        assert_eq!(enabled.texture_complexity, disabled.texture_complexity);
        assert_eq!(disabled.glcm, GlcmFeatures::neutral());
        assert_ne!(enabled.glcm, disabled.glcm);
    }

    #[test]
    fn test_edge_density_sees_the_square() {
        let mut image = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        for y in 25..75 {
            for x in 25..75 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        let report = analyze(&image, true);
        assert!(report.edge_density > 0.0);
        assert!(report.edge_density < 0.5);
    }

    #[test]
    fn test_checkerboard_is_rougher_than_flat() {
        let mut board = GrayImage::new(32, 32);
        for y in 0..32 {
            for x in 0..32 {
                if (x + y) % 2 == 0 {
                    board.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let rough = glcm::features(&board);

        let flat = glcm::features(&GrayImage::from_pixel(32, 32, Luma([128])));
        assert!(rough.contrast > flat.contrast);
    }

    #[test]
    fn test_box_mean_preserves_constant_field() {
        let field = Array2::from_elem((10, 10), 7.0);
        let smoothed = box_mean(&field);
        for v in smoothed.iter() {
            assert!((v - 7.0).abs() < 1e-9);
        }
    }
}
