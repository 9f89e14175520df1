use image::{ImageBuffer, Rgba};
use imageproc::map::map_colors;

use super::LUMA_WEIGHTS;

/// 4x5 affine color transform over `(R, G, B, A, 1)`.
///
/// Rows are output channels. The fifth column is an offset in 0-255 pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix([f32; 20]);

impl ColorMatrix {
    pub const fn new(values: [f32; 20]) -> Self {
        Self(values)
    }

    pub const fn identity() -> Self {
        Self([
            1.0, 0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Saturation matrix. `0.0` desaturates to luminance, `1.0` is the identity.
    pub fn saturation(saturation: f32) -> Self {
        let inv = 1.0 - saturation;
        let [r, g, b] = LUMA_WEIGHTS.map(|w| w * inv);
        Self([
            r + saturation, g, b, 0.0, 0.0, //
            r, g + saturation, b, 0.0, 0.0, //
            r, g, b + saturation, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Scales each color channel by `contrast` and adds `brightness`. Alpha is left alone.
    pub const fn contrast_brightness(contrast: f32, brightness: f32) -> Self {
        Self([
            contrast, 0.0, 0.0, 0.0, brightness, //
            0.0, contrast, 0.0, 0.0, brightness, //
            0.0, 0.0, contrast, 0.0, brightness, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    pub const fn values(&self) -> &[f32; 20] {
        &self.0
    }

    /// Applies the matrix to one pixel, rounding to nearest and saturating into `0..=255`.
    pub fn transform(&self, pixel: Rgba<u8>) -> Rgba<u8> {
        let input = pixel.0.map(f32::from);
        let m = &self.0;
        let channel = |row: usize| {
            let o = row * 5;
            let v = m[o] * input[0]
                + m[o + 1] * input[1]
                + m[o + 2] * input[2]
                + m[o + 3] * input[3]
                + m[o + 4];
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgba([channel(0), channel(1), channel(2), channel(3)])
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

pub trait ApplyColorMatrix {
    type Output;
    fn apply_color_matrix(&self, matrix: &ColorMatrix) -> Self::Output;
}

impl ApplyColorMatrix for ImageBuffer<Rgba<u8>, Vec<u8>> {
    type Output = ImageBuffer<Rgba<u8>, Vec<u8>>;

    fn apply_color_matrix(&self, matrix: &ColorMatrix) -> Self::Output {
        map_colors(self, |p| matrix.transform(p))
    }
}
