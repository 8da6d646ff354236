//! Per-channel color statistics and the derived green-dominance metrics.
//!
//! Unlike morphology this analyzer always produces a report: even a degenerate
//! image has well-defined channel means, and every ratio carries an explicit
//! divide-by-zero guard.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::hsv::rgb_to_hsv;

/// Open hue window (degrees) treated as green.
pub const GREEN_HUE_LOW: f64 = 80.0;
pub const GREEN_HUE_HIGH: f64 = 140.0;
/// Minimum mean saturation for a healthy green leaf.
pub const HEALTHY_SATURATION_MIN: f64 = 50.0;
/// Minimum mean brightness for a healthy green leaf.
pub const HEALTHY_VALUE_MIN: f64 = 100.0;

/// Mean and population standard deviation of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantColor {
    Green,
    NonGreen,
}

/// Color report over the full image region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorReport {
    pub hue: ChannelStats,
    pub saturation: ChannelStats,
    pub value: ChannelStats,
    pub red: ChannelStats,
    pub green: ChannelStats,
    pub blue: ChannelStats,
    pub dominant_color: DominantColor,
    /// Dominantly green AND saturated AND bright.
    pub is_healthy_green: bool,
    /// Average of the three RGB standard deviations; lower means more uniform.
    pub color_uniformity: f64,
    /// Mean green over mean red + blue; the `+1` guards an all-dark image.
    pub green_dominance: f64,
}

/// Accumulates mean/std for one channel in a single pass.
#[derive(Default)]
struct Accumulator {
    sum: f64,
    sum_sq: f64,
}

impl Accumulator {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.sum_sq += v * v;
    }

    fn stats(&self, n: f64) -> ChannelStats {
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        ChannelStats {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// Compute HSV and RGB channel statistics and the green metrics for `image`.
pub fn analyze(image: &RgbImage) -> ColorReport {
    let mut h = Accumulator::default();
    let mut s = Accumulator::default();
    let mut v = Accumulator::default();
    let mut r = Accumulator::default();
    let mut g = Accumulator::default();
    let mut b = Accumulator::default();

    for pixel in image.pixels() {
        let [pr, pg, pb] = pixel.0;
        let hsv = rgb_to_hsv(pr, pg, pb);
        h.push(hsv.h);
        s.push(hsv.s);
        v.push(hsv.v);
        r.push(f64::from(pr));
        g.push(f64::from(pg));
        b.push(f64::from(pb));
    }

    let n = f64::from(image.width()) * f64::from(image.height());
    let hue = h.stats(n);
    let saturation = s.stats(n);
    let value = v.stats(n);
    let red = r.stats(n);
    let green = g.stats(n);
    let blue = b.stats(n);

    let is_green = hue.mean > GREEN_HUE_LOW && hue.mean < GREEN_HUE_HIGH;
    let dominant_color = if is_green {
        DominantColor::Green
    } else {
        DominantColor::NonGreen
    };
    let is_healthy_green = is_green
        && saturation.mean > HEALTHY_SATURATION_MIN
        && value.mean > HEALTHY_VALUE_MIN;

    let color_uniformity = (red.std_dev + green.std_dev + blue.std_dev) / 3.0;
    let green_dominance = green.mean / (red.mean + blue.mean + 1.0);

    ColorReport {
        hue,
        saturation,
        value,
        red,
        green,
        blue,
        dominant_color,
        is_healthy_green,
        color_uniformity,
        green_dominance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_solid_leaf_green() {
        let image = RgbImage::from_pixel(64, 64, Rgb([40, 120, 45]));
        let report = analyze(&image);

        assert_eq!(report.dominant_color, DominantColor::Green);
        assert!(report.is_healthy_green);
        assert!((report.color_uniformity - 0.0).abs() < 1e-9);
        let expected = 120.0 / (40.0 + 45.0 + 1.0);
        assert!((report.green_dominance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_solid_red_is_not_green() {
        let image = RgbImage::from_pixel(32, 32, Rgb([200, 30, 30]));
        let report = analyze(&image);

        assert_eq!(report.dominant_color, DominantColor::NonGreen);
        assert!(!report.is_healthy_green);
    }

    #[test]
    fn test_black_image_guards_division() {
        let image = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        let report = analyze(&image);

        assert_eq!(report.green_dominance, 0.0);
        assert!(report.green_dominance.is_finite());
    }

    #[test]
    fn test_dim_green_is_green_but_not_healthy() {
        // Green hue, but too dark for a healthy leaf.
        let image = RgbImage::from_pixel(32, 32, Rgb([10, 60, 15]));
        let report = analyze(&image);

        assert_eq!(report.dominant_color, DominantColor::Green);
        assert!(!report.is_healthy_green);
    }

    #[test]
    fn test_uniformity_reflects_channel_spread() {
        let mut image = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        image.put_pixel(1, 0, Rgb([255, 255, 255]));
        let report = analyze(&image);

        // Each channel is a 0/255 split: population std is 127.5.
        assert!((report.color_uniformity - 127.5).abs() < 1e-9);
    }
}
