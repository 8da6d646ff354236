//! RGB to HSV conversion shared by the color analyzer and the
//! color-threshold leaf detector.
//!
//! Convention: hue in degrees `[0, 360)`, saturation and value scaled to
//! `[0, 255]` so the fixed 8-bit thresholds used elsewhere in the crate apply
//! without rescaling. Achromatic pixels get hue 0 and saturation 0.

/// One pixel in HSV space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`.
    pub h: f64,
    /// Saturation, `[0, 255]`.
    pub s: f64,
    /// Value (brightness), `[0, 255]`.
    pub v: f64,
}

/// Convert an 8-bit RGB triple to HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let r = f64::from(r);
    let g = f64::from(g);
    let b = f64::from(b);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    Hsv { h, s, v }
}
