//! Per-detector input tensor construction.

use image::imageops::FilterType;
use ndarray::{ArrayD, IxDyn};

use pyro_models::{Normalization, TargetSize};

use crate::frame::Frame;

/// Build the NCHW f32 input tensor one detector expects.
///
/// Pure and deterministic: Triangle (bilinear) interpolation for every
/// detector, `/scale` then per-channel mean subtraction, matching whichever
/// preprocessing the detector's training pipeline used. Polarity flipping is
/// an output concern and is never applied here.
pub fn normalize(frame: &Frame, target: TargetSize, norm: &Normalization) -> ArrayD<f32> {
    let resized = image::imageops::resize(
        frame.pixels(),
        target.width,
        target.height,
        FilterType::Triangle,
    );

    let (w, h) = (target.width as usize, target.height as usize);
    let mut chw_data: Vec<f32> = Vec::with_capacity(3 * h * w);

    // HWC -> CHW: [1, 3, H, W]
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let pixel = resized.get_pixel(x as u32, y as u32);
                chw_data.push(pixel[c] as f32 / norm.scale - norm.mean_offset[c]);
            }
        }
    }

    ArrayD::from_shape_vec(IxDyn(&[1, 3, h, w]), chw_data)
        .expect("tensor length matches 1x3xHxW shape")
}
