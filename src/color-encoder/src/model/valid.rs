use crate::{
    color::{apply_color_shift, channel_stats},
    data::{
        batch::{ColorBatch, ColorBatcher},
        conversion::{
            convert_tensor_to_stats, load_and_preprocess_image, load_rgb_image, to_unit_float,
        },
        loader::{ColorPairItem, ImagePair},
        normalize::NormalizeConfig,
    },
    model::encoder::ColorEncoder,
    utils::metrics::{mean_finite, psnr},
};
use burn::{
    data::dataloader::batcher::Batcher,
    nn::loss::{MseLoss, Reduction},
    prelude::*,
};
use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use log::warn;

/// Epoch summary on the held-out pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    /// Mean squared error between predicted and clean statistics.
    pub loss: f32,
    /// Mean PSNR of the raw scans against their clean images.
    pub psnr_scan: Option<f32>,
    /// Mean PSNR after shifting the scans onto the predicted statistics.
    pub psnr_corrected: Option<f32>,
    pub evaluated: usize,
    pub skipped: usize,
}

pub fn validate_epoch<B: Backend>(
    model: &ColorEncoder<B>,
    pairs: &[ImagePair],
    image_size: u32,
    normalize_config: &NormalizeConfig,
    device: &B::Device,
) -> Result<ValidationReport> {
    let mut total_loss = 0.0;
    let mut psnr_scan = Vec::with_capacity(pairs.len());
    let mut psnr_corrected = Vec::with_capacity(pairs.len());
    let mut skipped = 0;
    let batcher = ColorBatcher::eval(normalize_config.clone());
    let loss_fn = MseLoss::new();

    for pair in pairs {
        let (clean, clean_stats) = load_and_preprocess_image(&pair.clean, image_size)
            .wrap_err_with(|| format!("Failed to load clean image {:?}", pair.clean))?;
        let scan_u8 = load_rgb_image(&pair.scan, image_size)
            .wrap_err_with(|| format!("Failed to load scan image {:?}", pair.scan))?;
        let scan = to_unit_float(&scan_u8);
        let scan_stats = channel_stats(&scan);

        if let Some(channel) = scan_stats.zero_variance_channel() {
            warn!(
                "Skipping {:?}: {channel} channel of the scan has zero variance",
                pair.scan
            );
            skipped += 1;
            continue;
        }

        let item = ColorPairItem {
            scan: scan_u8,
            target: clean_stats.to_vector(),
        };
        let ColorBatch { images, targets }: ColorBatch<B> = batcher.batch(vec![item], device);
        let output = model.forward(images);
        let loss = loss_fn.forward(output.clone(), targets, Reduction::Mean);
        total_loss += loss.into_scalar().elem::<f32>();

        let predicted = convert_tensor_to_stats(output)?
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("Model returned no prediction for {:?}", pair.scan))?;

        psnr_scan.push(psnr(&scan, &clean)?);
        match apply_color_shift(&scan, &scan_stats, &predicted) {
            Ok(corrected) => psnr_corrected.push(psnr(&corrected, &clean)?),
            Err(e) => warn!("Could not correct {:?}: {e}", pair.scan),
        }
    }

    let evaluated = pairs.len() - skipped;
    Ok(ValidationReport {
        loss: if evaluated == 0 {
            0.0
        } else {
            total_loss / evaluated as f32
        },
        psnr_scan: mean_finite(&psnr_scan),
        psnr_corrected: mean_finite(&psnr_corrected),
        evaluated,
        skipped,
    })
}
