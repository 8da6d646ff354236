//! Leaf region isolation before feature extraction.
//!
//! Two strategies, chosen by the caller: cropping around the largest contour
//! of a precomputed binary mask, or detecting a cassava-green region by color
//! thresholding. Both degrade to the original image when nothing usable is
//! found; region extraction never fails.

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::contours::{find_contours, Contour};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_polygon_mut;
use imageproc::morphology::{close, open};
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity};
use tracing::warn;

use crate::hsv::rgb_to_hsv;
use crate::morphology::{bounding_box, contour_area, contour_perimeter};

/// Padding around the mask bounding box, clamped to the image bounds.
pub const CROP_PADDING: u32 = 10;

/// Inclusive hue band for cassava-like green, in degrees. Tuned as 30-90 on
/// the half-degree hue scale, so it spans yellow-green through cyan here.
const HUE_BAND: (f64, f64) = (60.0, 180.0);
/// Saturation band excluding washed-out and oversaturated pixels.
const SATURATION_BAND: (f64, f64) = (40.0, 200.0);
/// Brightness band excluding very dark and very bright pixels.
const VALUE_BAND: (f64, f64) = (50.0, 220.0);

/// Radius of the square structuring element for opening/closing (7x7 kernel).
const DENOISE_RADIUS: u8 = 3;
/// Connected components below this pixel area are treated as noise.
const MIN_COMPONENT_AREA: usize = 500;
/// Contours below this area are never accepted as a leaf.
const MIN_LEAF_AREA: f64 = 2000.0;
/// Accepted circularity window; leaves are irregular but not filamentous.
const CIRCULARITY_RANGE: (f64, f64) = (0.1, 0.7);
/// Accepted bounding-box aspect ratio window.
const ASPECT_RANGE: (f64, f64) = (0.3, 3.0);

/// Region extraction strategy.
#[derive(Debug, Clone, Copy)]
pub enum ExtractionMode<'a> {
    /// Crop to the largest contour of a binary mask aligned with the image.
    MaskGuided(&'a GrayImage),
    /// Detect a green region by color thresholding and return an RGBA
    /// composite where alpha is the leaf silhouette.
    ColorThreshold,
}

/// Isolate the leaf region of `image` with the chosen strategy.
///
/// Always returns an image: the original one whenever the strategy finds no
/// usable region (logged as a warning, never an error).
pub fn extract_leaf_region(image: &DynamicImage, mode: ExtractionMode) -> DynamicImage {
    match mode {
        ExtractionMode::MaskGuided(mask) => crop_to_mask(image, mask),
        ExtractionMode::ColorThreshold => extract_by_color_threshold(image),
    }
}

/// Crop `image` to the padded bounding box of the largest mask contour.
///
/// An empty mask (no contour) is a non-fatal fallback: the image comes back
/// unchanged.
pub fn crop_to_mask(image: &DynamicImage, mask: &GrayImage) -> DynamicImage {
    let contours: Vec<Contour<i32>> = find_contours(mask);
    let Some(largest) = contours
        .iter()
        .filter(|c| c.parent.is_none())
        .max_by(|a, b| {
            contour_area(&a.points)
                .partial_cmp(&contour_area(&b.points))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    else {
        warn!("mask contains no contour, returning image uncropped");
        return image.clone();
    };

    let min_x = largest.points.iter().map(|p| p.x).min().unwrap_or(0).max(0) as u32;
    let min_y = largest.points.iter().map(|p| p.y).min().unwrap_or(0).max(0) as u32;
    let (bb_w, bb_h) = bounding_box(&largest.points);

    let x = min_x.saturating_sub(CROP_PADDING);
    let y = min_y.saturating_sub(CROP_PADDING);
    let w = (bb_w + 2 * CROP_PADDING).min(image.width() - x);
    let h = (bb_h + 2 * CROP_PADDING).min(image.height() - y);

    image.crop_imm(x, y, w, h)
}

/// Detect the dominant cassava-green region and composite it over
/// transparency.
///
/// The pipeline mirrors the classic color-threshold detector: HSV band mask,
/// morphological opening then closing, small-component removal, then a shape
/// filter (area, circularity, aspect ratio) over the surviving contours. If no
/// contour survives, the original image is returned unchanged.
pub fn extract_by_color_threshold(image: &DynamicImage) -> DynamicImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let mut mask = GrayImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let hsv = rgb_to_hsv(r, g, b);
        let in_band = hsv.h >= HUE_BAND.0
            && hsv.h <= HUE_BAND.1
            && hsv.s > SATURATION_BAND.0
            && hsv.s < SATURATION_BAND.1
            && hsv.v > VALUE_BAND.0
            && hsv.v < VALUE_BAND.1;
        if in_band {
            mask.put_pixel(x, y, Luma([255]));
        }
    }

    let mask = open(&mask, Norm::LInf, DENOISE_RADIUS);
    let mask = close(&mask, Norm::LInf, DENOISE_RADIUS);
    let mask = remove_small_components(&mask, MIN_COMPONENT_AREA);

    let contours: Vec<Contour<i32>> = find_contours(&mask);
    let Some(leaf) = contours
        .iter()
        .filter(|c| c.parent.is_none() && is_leaf_shaped(&c.points))
        .max_by(|a, b| {
            contour_area(&a.points)
                .partial_cmp(&contour_area(&b.points))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    else {
        warn!("no contour passed the leaf shape filters, returning original image");
        return image.clone();
    };

    let Some(silhouette) = fill_contour(width, height, &leaf.points) else {
        warn!("leaf contour was degenerate, returning original image");
        return image.clone();
    };

    let mut rgba = RgbaImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let alpha = silhouette.get_pixel(x, y).0[0];
        rgba.put_pixel(x, y, Rgba([r, g, b, alpha]));
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Area, circularity and aspect-ratio filter for candidate leaf contours.
fn is_leaf_shaped(points: &[Point<i32>]) -> bool {
    let area = contour_area(points);
    if area <= MIN_LEAF_AREA {
        return false;
    }
    let perimeter = contour_perimeter(points);
    if perimeter <= 0.0 {
        return false;
    }

    let circularity = 4.0 * std::f64::consts::PI * area / (perimeter * perimeter);
    if circularity <= CIRCULARITY_RANGE.0 || circularity >= CIRCULARITY_RANGE.1 {
        return false;
    }

    let (bb_w, bb_h) = bounding_box(points);
    if bb_h == 0 {
        return false;
    }
    let aspect = f64::from(bb_w) / f64::from(bb_h);
    aspect > ASPECT_RANGE.0 && aspect < ASPECT_RANGE.1
}

/// Zero out connected components smaller than `min_area` pixels.
fn remove_small_components(mask: &GrayImage, min_area: usize) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let max_label = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;
    let mut areas = vec![0usize; max_label + 1];
    for p in labels.pixels() {
        areas[p.0[0] as usize] += 1;
    }

    let mut cleaned = GrayImage::new(mask.width(), mask.height());
    for (x, y, p) in labels.enumerate_pixels() {
        let label = p.0[0] as usize;
        if label != 0 && areas[label] > min_area {
            cleaned.put_pixel(x, y, Luma([255]));
        }
    }
    cleaned
}

/// Rasterize a closed contour into a filled binary silhouette.
///
/// Returns `None` for contours that cannot form a polygon.
fn fill_contour(width: u32, height: u32, points: &[Point<i32>]) -> Option<GrayImage> {
    let mut polygon: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for p in points {
        if polygon.last() != Some(p) {
            polygon.push(*p);
        }
    }
    // draw_polygon_mut requires an open point list.
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() < 3 {
        return None;
    }

    let mut silhouette = GrayImage::new(width, height);
    draw_polygon_mut(&mut silhouette, &polygon, Luma([255]));
    Some(silhouette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn white_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    #[test]
    fn test_empty_mask_returns_image_unchanged() {
        let image = white_image(120, 90);
        let mask = GrayImage::new(120, 90);

        let result = crop_to_mask(&image, &mask);
        assert_eq!(result.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_mask_crop_pads_and_clamps() {
        let image = white_image(200, 200);
        let mut mask = GrayImage::new(200, 200);
        for y in 60..90 {
            for x in 50..100 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let cropped = crop_to_mask(&image, &mask);
        // Bounding box 50x30 plus 10 px padding on each side.
        assert_eq!(cropped.width(), 70);
        assert_eq!(cropped.height(), 50);
    }

    #[test]
    fn test_mask_at_border_clamps_to_image() {
        let image = white_image(60, 60);
        let mut mask = GrayImage::new(60, 60);
        for y in 0..20 {
            for x in 0..20 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let cropped = crop_to_mask(&image, &mask);
        assert!(cropped.width() <= 60);
        assert!(cropped.height() <= 60);
    }

    #[test]
    fn test_color_threshold_without_green_returns_original() {
        let image = white_image(100, 100);
        let result = extract_by_color_threshold(&image);
        assert_eq!(result.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_color_threshold_extracts_plus_shape() {
        // A plus shape has leaf-like circularity (well under a disk's) while
        // keeping a square bounding box.
        let mut rgb = RgbImage::from_pixel(300, 300, Rgb([128, 128, 128]));
        let green = Rgb([160, 180, 60]);
        for y in 130..170 {
            for x in 75..225 {
                rgb.put_pixel(x, y, green);
            }
        }
        for y in 75..225 {
            for x in 130..170 {
                rgb.put_pixel(x, y, green);
            }
        }

        let result = extract_by_color_threshold(&DynamicImage::ImageRgb8(rgb));
        let rgba = result.to_rgba8();

        // Center of the plus is opaque leaf, corners are transparent.
        assert_eq!(rgba.get_pixel(150, 150).0[3], 255);
        assert_eq!(rgba.get_pixel(5, 5).0[3], 0);
        assert_eq!(rgba.get_pixel(290, 290).0[3], 0);
    }

    #[test]
    fn test_color_threshold_detects_dark_leaf_green() {
        // Typical cassava green sits near hue 124, well above yellow-green.
        let mut rgb = RgbImage::from_pixel(300, 300, Rgb([128, 128, 128]));
        let green = Rgb([40, 120, 45]);
        for y in 130..170 {
            for x in 75..225 {
                rgb.put_pixel(x, y, green);
            }
        }
        for y in 75..225 {
            for x in 130..170 {
                rgb.put_pixel(x, y, green);
            }
        }

        let result = extract_by_color_threshold(&DynamicImage::ImageRgb8(rgb));
        let rgba = result.to_rgba8();

        assert_eq!(rgba.get_pixel(150, 150).0[3], 255);
        assert_eq!(rgba.get_pixel(5, 5).0[3], 0);
    }

    #[test]
    fn test_small_noise_is_removed() {
        let mut mask = GrayImage::new(100, 100);
        // A 5x5 blip, well under the area floor.
        for y in 10..15 {
            for x in 10..15 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let cleaned = remove_small_components(&mask, MIN_COMPONENT_AREA);
        assert!(cleaned.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_shape_filter_rejects_disk_and_thin_strip() {
        // Disk: circularity close to 1.
        let mut disk: Vec<Point<i32>> = Vec::new();
        for i in 0..360 {
            let theta = f64::from(i).to_radians();
            disk.push(Point::new(
                (150.0 + 60.0 * theta.cos()) as i32,
                (150.0 + 60.0 * theta.sin()) as i32,
            ));
        }
        assert!(!is_leaf_shaped(&disk));

        // Thin strip: aspect ratio far outside the accepted window.
        let strip = vec![
            Point::new(0, 0),
            Point::new(250, 0),
            Point::new(250, 20),
            Point::new(0, 20),
        ];
        assert!(!is_leaf_shaped(&strip));
    }
}
