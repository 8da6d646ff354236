//! Deterministic cassava-leaf identification gate.
//!
//! Given a decoded RGB image, the pipeline extracts three independent feature
//! reports (shape morphology, color statistics, texture descriptors) and
//! combines them through a fixed weighted-voting rule engine into a
//! cassava / not-cassava verdict with a confidence score and a per-check
//! breakdown. The verdict is intended as a gate in front of a separately
//! trained disease classifier: images that are not cassava leaves at all get
//! rejected before any disease inference runs.
//!
//! The pipeline is stateless and synchronous: each call is a pure function of
//! its inputs, so one [`LeafAnalyzer`] can serve concurrent analyses.
//!
//! ```no_run
//! use cassava_leaf_id::{LeafAnalyzer, LeafType};
//!
//! let analyzer = LeafAnalyzer::default();
//! let image = image::open("leaf.jpg")?;
//! let analysis = analyzer.analyze(&image)?;
//! if analysis.classification.predicted_type == LeafType::Cassava {
//!     // hand off to disease inference
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub mod classifier;
pub mod color;
pub mod config;
pub mod errors;
pub mod glcm;
pub mod hsv;
pub mod mocks;
#[cfg(feature = "onnx")]
pub mod model;
pub mod morphology;
pub mod region;
pub mod texture;
pub mod traits;

pub use classifier::{ClassificationVerdict, LeafType};
pub use color::ColorReport;
pub use config::Config;
pub use errors::{LeafIdError, Result};
pub use morphology::MorphologyReport;
pub use region::{extract_leaf_region, ExtractionMode};
pub use texture::TextureReport;
pub use traits::SegmentationModel;

/// Capabilities resolved once at startup and passed down, rather than probed
/// on every call.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerOptions {
    /// Whether the co-occurrence texture computation is available. When
    /// false, its five scalars take the neutral fallback value.
    pub glcm_enabled: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self { glcm_enabled: true }
    }
}

/// Full feature extraction output plus the classification verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafAnalysis {
    /// Absent when edge detection finds no contour ("no distinguishable
    /// subject"); the classifier then simply evaluates fewer checks.
    pub morphology: Option<MorphologyReport>,
    pub color: ColorReport,
    pub texture: TextureReport,
    pub classification: ClassificationVerdict,
}

impl LeafAnalysis {
    pub fn is_cassava(&self) -> bool {
        self.classification.predicted_type == LeafType::Cassava
    }
}

/// The analysis pipeline: three analyzers and the rule-engine classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafAnalyzer {
    options: AnalyzerOptions,
}

impl LeafAnalyzer {
    pub const fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    /// Run full feature extraction and classification on `image`.
    ///
    /// # Errors
    ///
    /// Fails only for invalid input: an image with fewer than three channels
    /// or zero size. Every other degraded condition (no contour, disabled
    /// co-occurrence computation) is absorbed into the reports.
    pub fn analyze(&self, image: &DynamicImage) -> Result<LeafAnalysis> {
        if image.color().channel_count() < 3 {
            return Err(LeafIdError::invalid_input(format!(
                "expected an RGB image, got {} channel(s)",
                image.color().channel_count()
            )));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(LeafIdError::invalid_input("image has zero size"));
        }

        let rgb = image.to_rgb8();

        let morphology = morphology::analyze(&rgb);
        if morphology.is_none() {
            debug!("no contour found, classifying without morphology checks");
        }
        let color = color::analyze(&rgb);
        let texture = texture::analyze(&rgb, self.options.glcm_enabled);

        let classification = classifier::classify(morphology.as_ref(), &color, &texture);

        Ok(LeafAnalysis {
            morphology,
            color,
            texture,
            classification,
        })
    }

    /// Decode the image at `path` and run [`Self::analyze`] on it.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or decoded, or when the decoded
    /// image is invalid input for analysis.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<LeafAnalysis> {
        let image = image::open(path.as_ref())?;
        self.analyze(&image)
    }
}

/// Run a segmentation model and crop the image around the predicted mask.
///
/// Model failure is non-fatal: the original image is returned unchanged with
/// a logged warning, matching the behavior of the other region-extraction
/// fallbacks.
pub fn segment_and_crop<M: SegmentationModel>(model: &M, image: &DynamicImage) -> DynamicImage {
    let rgb = image.to_rgb8();
    match model.predict_mask(&rgb) {
        Ok(mask) => region::crop_to_mask(image, &mask),
        Err(err) => {
            warn!(error = %err, "segmentation failed, using original image");
            image.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbImage};

    #[test]
    fn test_grayscale_input_is_rejected() {
        let analyzer = LeafAnalyzer::default();
        let gray = DynamicImage::ImageLuma8(GrayImage::new(50, 50));

        let err = analyzer.analyze(&gray).unwrap_err();
        assert!(matches!(err, LeafIdError::InvalidInput { .. }));
    }

    #[test]
    fn test_blank_image_still_produces_a_verdict() {
        let analyzer = LeafAnalyzer::default();
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 80, Rgb([255, 255, 255])));

        let analysis = analyzer.analyze(&blank).unwrap();
        assert!(analysis.morphology.is_none());
        assert!(analysis.classification.total_checks > 0);
        assert!(analysis.classification.confidence >= 0.0);
        assert!(analysis.classification.confidence <= 1.0);
    }

    #[test]
    fn test_segment_and_crop_with_empty_mask_keeps_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(60, 60, Rgb([0, 120, 0])));
        let model = mocks::MockSegmentationModel::empty(224);

        let result = segment_and_crop(&model, &image);
        assert_eq!(result.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_segment_and_crop_with_rect_mask_crops() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 200, Rgb([0, 120, 0])));
        let model = mocks::MockSegmentationModel::with_rect(224, 50, 60, 50, 30);

        let result = segment_and_crop(&model, &image);
        assert_eq!(result.width(), 70);
        assert_eq!(result.height(), 50);
    }

    #[test]
    fn test_analyze_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        RgbImage::from_pixel(64, 64, Rgb([40, 120, 45]))
            .save(&path)
            .unwrap();

        let analyzer = LeafAnalyzer::default();
        let analysis = analyzer.analyze_file(&path).unwrap();
        assert_eq!(analysis.color.dominant_color, color::DominantColor::Green);
    }

    #[test]
    fn test_analyze_file_reports_decode_failure() {
        let analyzer = LeafAnalyzer::default();
        let err = analyzer
            .analyze_file("definitely/not/a/real/leaf.png")
            .unwrap_err();
        assert!(matches!(err, LeafIdError::ImageProcessing { .. }));
    }

    #[test]
    fn test_analysis_serializes_to_json() {
        let analyzer = LeafAnalyzer::default();
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([10, 200, 20])));

        let analysis = analyzer.analyze(&blank).unwrap();
        let json = serde_json::to_string(&analysis).unwrap();
        let parsed: LeafAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, analysis);
    }
}
