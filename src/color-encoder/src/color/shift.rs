use crate::{
    color::{Channel, ColorStats},
    error::{ColorError, Result},
};
use image::{Rgb, Rgb32FImage};

/// Re-maps each channel of `image` from the `scan` distribution onto the `clean` one:
///
/// `out = clip(((in - scan.mean) / scan.std) * clean.std + clean.mean, 0, 1)`
///
/// Every `scan.std` must be finite and strictly positive, otherwise
/// [`ColorError::ZeroVariance`] is returned for the first offending channel. Use
/// [`ColorStats::has_zero_variance`] to guard beforehand.
pub fn apply_color_shift(
    image: &Rgb32FImage,
    scan: &ColorStats,
    clean: &ColorStats,
) -> Result<Rgb32FImage> {
    if let Some(channel) = scan.zero_variance_channel() {
        return Err(ColorError::ZeroVariance { channel });
    }
    check_finite("scan mean", &scan.mean)?;
    check_finite("clean mean", &clean.mean)?;
    check_finite("clean std", &clean.std)?;

    let mut out = Rgb32FImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let mut shifted = [0f32; 3];
        for c in Channel::ALL.map(Channel::index) {
            let normalized = (pixel[c] - scan.mean[c]) / scan.std[c];
            shifted[c] = (normalized * clean.std[c] + clean.mean[c]).clamp(0.0, 1.0);
        }
        out.put_pixel(x, y, Rgb(shifted));
    }
    Ok(out)
}

fn check_finite(which: &'static str, values: &[f32; 3]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(ColorError::NonFiniteStats { which, value }),
        None => Ok(()),
    }
}
