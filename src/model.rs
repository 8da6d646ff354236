//! ONNX-backed leaf segmentation model (enabled by the `onnx` feature).
//!
//! The session is loaded once and only read afterwards, so one instance can
//! serve concurrent analyses. The model contract follows the exported U-Net:
//! one input named `image` of shape `[1, 3, S, S]` with values in `[0, 1]`,
//! one output named `mask` of shape `[1, 1, S, S]` with sigmoid activations.

use std::path::Path;

use image::{imageops, imageops::FilterType, GrayImage, Luma, RgbImage};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::session::{builder::SessionBuilder, Session};
use ort::value::TensorRef;
use parking_lot::Mutex;

use crate::errors::{LeafIdError, Result};
use crate::traits::SegmentationModel;

/// Sigmoid activation threshold separating leaf from background.
const MASK_THRESHOLD: f32 = 0.5;

pub struct OnnxSegmenter {
    input_size: u32,
    session: Mutex<Session>,
}

impl OnnxSegmenter {
    pub fn new(model_path: &Path) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| LeafIdError::Model {
                operation: "session builder initialization".to_string(),
                source: Box::new(e),
            })?
            .with_memory_pattern(true)
            .map_err(|e| LeafIdError::Model {
                operation: "memory pattern configuration".to_string(),
                source: Box::new(e),
            })?
            .commit_from_file(model_path)
            .map_err(|e| LeafIdError::Model {
                operation: format!("loading model file: {}", model_path.display()),
                source: Box::new(e),
            })?;

        let input_size =
            session.inputs[0]
                .input_type
                .tensor_shape()
                .ok_or_else(|| LeafIdError::Model {
                    operation: "reading model input shape".to_string(),
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "tensor shape unavailable",
                    )),
                })?[2] as u32;

        // Warmup run so the first real prediction pays no allocation cost.
        let data = Array4::<f32>::zeros((1, 3, input_size as usize, input_size as usize));
        session
            .run(ort::inputs!["image" => TensorRef::from_array_view(&data).map_err(|e| {
                LeafIdError::Model {
                    operation: "building warmup tensor".to_string(),
                    source: Box::new(e),
                }
            })?])
            .map_err(|e| LeafIdError::Model {
                operation: "warmup inference".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            input_size,
            session: Mutex::new(session),
        })
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let mut session = self.session.lock();
        let outputs = session.run(
            ort::inputs!["image" => TensorRef::from_array_view(&tensor.as_standard_layout())?],
        )?;
        Ok(outputs["mask"]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()
            .map_err(|e| LeafIdError::Model {
                operation: "mask tensor shape conversion".to_string(),
                source: Box::new(e),
            })?
            .to_owned())
    }
}

impl SegmentationModel for OnnxSegmenter {
    fn predict_mask(&self, image: &RgbImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();
        let size = self.input_size;

        let resized = imageops::resize(image, size, size, FilterType::Lanczos3);
        let tensor = resized
            .as_ndarray3()
            .slice(s![NewAxis, .., .., ..])
            .map(|&v| f32::from(v) / 255.0);

        let mask = self.predict(tensor.view())?;

        let mut binary = GrayImage::new(size, size);
        for ((_, _, row, col), &activation) in mask.indexed_iter() {
            if activation > MASK_THRESHOLD {
                binary.put_pixel(col as u32, row as u32, Luma([255]));
            }
        }

        Ok(imageops::resize(
            &binary,
            width,
            height,
            FilterType::Nearest,
        ))
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }
}
