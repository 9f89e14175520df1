mod color_matrix;

pub use color_matrix::{ApplyColorMatrix, ColorMatrix};

/// Rec. 709 luminance weights used when removing saturation.
pub const LUMA_WEIGHTS: [f32; 3] = [0.213, 0.715, 0.072];
