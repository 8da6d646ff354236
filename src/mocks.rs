//! Deterministic segmentation model stand-ins for tests.

use image::{GrayImage, Luma, RgbImage};

use crate::errors::Result;
use crate::traits::SegmentationModel;

/// Segmentation model fake producing a fixed mask shape.
#[derive(Debug, Clone)]
pub struct MockSegmentationModel {
    input_size: u32,
    /// Foreground rectangle (x, y, width, height); `None` marks everything
    /// foreground, `Some` with zero size marks everything background.
    rect: Option<(u32, u32, u32, u32)>,
}

impl MockSegmentationModel {
    /// Model marking the entire image as leaf.
    pub const fn full(input_size: u32) -> Self {
        Self {
            input_size,
            rect: None,
        }
    }

    /// Model producing an all-zero mask.
    pub const fn empty(input_size: u32) -> Self {
        Self {
            input_size,
            rect: Some((0, 0, 0, 0)),
        }
    }

    /// Model marking a fixed rectangle as leaf.
    pub const fn with_rect(input_size: u32, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            input_size,
            rect: Some((x, y, width, height)),
        }
    }
}

impl SegmentationModel for MockSegmentationModel {
    fn predict_mask(&self, image: &RgbImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();
        let mut mask = match self.rect {
            None => GrayImage::from_pixel(width, height, Luma([255])),
            Some(_) => GrayImage::new(width, height),
        };
        if let Some((x, y, w, h)) = self.rect {
            for yy in y..(y + h).min(height) {
                for xx in x..(x + w).min(width) {
                    mask.put_pixel(xx, yy, Luma([255]));
                }
            }
        }
        Ok(mask)
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_rect_mock_shape() {
        let mock = MockSegmentationModel::with_rect(224, 10, 20, 30, 40);
        let image = RgbImage::from_pixel(100, 100, Rgb([0, 128, 0]));

        let mask = mock.predict_mask(&image).unwrap();
        assert_eq!(mask.dimensions(), (100, 100));
        assert_eq!(mask.get_pixel(15, 25).0[0], 255);
        assert_eq!(mask.get_pixel(5, 5).0[0], 0);
        assert_eq!(mock.input_size(), 224);
    }

    #[test]
    fn test_empty_mock_is_all_background() {
        let mock = MockSegmentationModel::empty(224);
        let image = RgbImage::from_pixel(50, 50, Rgb([0, 128, 0]));

        let mask = mock.predict_mask(&image).unwrap();
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }
}
