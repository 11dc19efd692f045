use crate::error::{ColorError, Result};
use image::Rgb32FImage;

/// Peak signal-to-noise ratio in decibels with a peak value of 1.0.
///
/// Identical images have zero error and return `f32::INFINITY`.
pub fn psnr(a: &Rgb32FImage, b: &Rgb32FImage) -> Result<f32> {
    if a.dimensions() != b.dimensions() {
        return Err(ColorError::ShapeMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }

    let samples = a.as_raw().len();
    if samples == 0 {
        return Ok(f32::INFINITY);
    }
    let sq_err: f64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum();
    let mse = sq_err / samples as f64;
    if mse == 0.0 {
        return Ok(f32::INFINITY);
    }

    Ok((20.0 * (1.0 / mse.sqrt()).log10()) as f32)
}

/// Mean of the finite values, or `None` when there are none.
pub fn mean_finite(values: &[f32]) -> Option<f32> {
    let finite: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f32>() / finite.len() as f32)
}
