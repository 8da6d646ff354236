use image::{GrayImage, RgbImage};

use crate::errors::Result;

/// Abstraction over the pretrained leaf segmentation model.
///
/// The model is an external collaborator: analysis never requires one, and
/// callers that want mask-guided cropping construct an implementation and
/// pass it in explicitly. Keeping the model behind a trait (instead of
/// ambient global state) lets tests substitute a deterministic fake.
///
/// Implementations must be safe for concurrent read access; inference does
/// not mutate model weights.
pub trait SegmentationModel: Send + Sync {
    /// Predict a binary leaf mask ({0, 255}) with the same dimensions as
    /// `image`.
    fn predict_mask(&self, image: &RgbImage) -> Result<GrayImage>;

    /// Side length of the square input the model consumes.
    fn input_size(&self) -> u32;
}
