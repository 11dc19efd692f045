use crate::{
    color::Channel,
    error::{ColorError, Result},
};
use image::Rgb32FImage;

/// Number of values in a flattened statistics vector: three means then three stds.
pub const STATS_VECTOR_LEN: usize = 6;

/// Per-channel mean and population standard deviation of an RGB image.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorStats {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl ColorStats {
    pub fn new(mean: [f32; 3], std: [f32; 3]) -> Self {
        Self { mean, std }
    }

    /// Flattens to `[mean_r, mean_g, mean_b, std_r, std_g, std_b]`, the layout the
    /// regression head is trained on.
    pub fn to_vector(&self) -> [f32; STATS_VECTOR_LEN] {
        [
            self.mean[0],
            self.mean[1],
            self.mean[2],
            self.std[0],
            self.std[1],
            self.std[2],
        ]
    }

    pub fn from_vector(values: &[f32]) -> Result<Self> {
        if values.len() != STATS_VECTOR_LEN {
            return Err(ColorError::VectorLength {
                expected: STATS_VECTOR_LEN,
                actual: values.len(),
            });
        }
        Ok(Self {
            mean: [values[0], values[1], values[2]],
            std: [values[3], values[4], values[5]],
        })
    }

    /// First channel whose standard deviation is zero (or not a positive number).
    pub fn zero_variance_channel(&self) -> Option<Channel> {
        Channel::ALL
            .into_iter()
            .find(|c| !(self.std[c.index()] > 0.0 && self.std[c.index()].is_finite()))
    }

    pub fn has_zero_variance(&self) -> bool {
        self.zero_variance_channel().is_some()
    }
}

/// Computes per-channel mean and population standard deviation.
///
/// Uniform channels report a standard deviation of exactly zero; this is not an
/// error here; [`apply_color_shift`](crate::color::apply_color_shift) rejects such
/// statistics as a shift source. An empty image yields all zeros.
pub fn channel_stats(image: &Rgb32FImage) -> ColorStats {
    let count = (image.width() as u64) * (image.height() as u64);
    if count == 0 {
        return ColorStats::default();
    }

    let mut sum = [0f64; 3];
    let mut lo = [f32::INFINITY; 3];
    let mut hi = [f32::NEG_INFINITY; 3];
    for p in image.pixels() {
        for c in 0..3 {
            sum[c] += p[c] as f64;
            lo[c] = lo[c].min(p[c]);
            hi[c] = hi[c].max(p[c]);
        }
    }
    let mean = sum.map(|s| s / count as f64);

    let mut sq = [0f64; 3];
    for p in image.pixels() {
        for c in 0..3 {
            let d = p[c] as f64 - mean[c];
            sq[c] += d * d;
        }
    }

    let mut stats = ColorStats::default();
    for c in 0..3 {
        // Summation rounding must not leave a residual spread on a flat channel.
        if lo[c] == hi[c] {
            stats.mean[c] = lo[c];
            stats.std[c] = 0.0;
        } else {
            stats.mean[c] = mean[c] as f32;
            stats.std[c] = (sq[c] / count as f64).sqrt() as f32;
        }
    }
    stats
}
