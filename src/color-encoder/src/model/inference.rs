use crate::{
    color::{ColorStats, apply_color_shift, channel_stats},
    data::{
        conversion::{convert_image_to_tensor, convert_tensor_to_stats, to_unit_float},
        normalize::{NormalizeConfig, normalize},
    },
    model::encoder::ColorEncoder,
};
use burn::prelude::*;
use color_eyre::{Result, eyre::eyre};
use image::{Rgb32FImage, RgbImage};

/// Predicts the clean color statistics for one scan.
pub fn predict_stats<B: Backend>(
    model: &ColorEncoder<B>,
    scan: &RgbImage,
    normalize_config: &NormalizeConfig,
    device: &B::Device,
) -> Result<ColorStats> {
    let input = normalize(convert_image_to_tensor::<B>(scan, device), normalize_config);
    let output = model.forward(input);
    convert_tensor_to_stats(output)?
        .into_iter()
        .next()
        .ok_or_else(|| eyre!("Model returned no prediction"))
}

/// Shifts a scan from its measured statistics onto the predicted clean statistics.
pub fn correct_image<B: Backend>(
    model: &ColorEncoder<B>,
    scan: &RgbImage,
    normalize_config: &NormalizeConfig,
    device: &B::Device,
) -> Result<(Rgb32FImage, ColorStats)> {
    let predicted = predict_stats(model, scan, normalize_config, device)?;
    let scan_f = to_unit_float(scan);
    let scan_stats = channel_stats(&scan_f);
    let corrected = apply_color_shift(&scan_f, &scan_stats, &predicted)?;
    Ok((corrected, predicted))
}
