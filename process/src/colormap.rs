//! Viridis colour map, interpolated between evenly spaced control points.

use image::Rgb;

const VIRIDIS: [[u8; 3]; 9] = [
    [0x44, 0x01, 0x54],
    [0x47, 0x2c, 0x7a],
    [0x3b, 0x51, 0x8b],
    [0x2c, 0x71, 0x8e],
    [0x21, 0x90, 0x8d],
    [0x27, 0xad, 0x81],
    [0x5c, 0xc8, 0x63],
    [0xaa, 0xdc, 0x32],
    [0xfd, 0xe7, 0x25],
];

/// Maps `t` in `[0, 1]` to a colour; out of range and NaN values clamp.
pub fn viridis(t: f32) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f32;
    let low = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - low as f32;

    let (a, b) = (VIRIDIS[low], VIRIDIS[low + 1]);
    Rgb(std::array::from_fn(|c| {
        (a[c] as f32 + (b[c] as f32 - a[c] as f32) * frac).round() as u8
    }))
}

/// Linear normaliser from `[min, max]` onto `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    min: f32,
    max: f32,
}

impl Normalize {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a f32>) -> Self {
        let (min, max) = values
            .into_iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        Self { min, max }
    }

    pub fn apply(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if !range.is_finite() || range <= 0.0 {
            return 0.0;
        }
        (value - self.min) / range
    }
}
