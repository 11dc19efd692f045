use crate::{
    common::IMAGE_SIZE,
    data::{
        augmentation::AugmentationConfig,
        batch::{ColorBatch, ColorBatcher},
        loader::{ColorPairDataset, ImagePair, find_image_pairs},
        normalize::NormalizeConfig,
    },
    model::{
        backbone::Backbone, encoder::ColorEncoder, pretrained::load_backbone_record,
        valid::validate_epoch,
    },
    utils::app_paths::AppPaths,
};

use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{AdamConfig, GradientsParams, Optimizer, decay::WeightDecayConfig},
    prelude::*,
    record::CompactRecorder,
    tensor::backend::AutodiffBackend,
};
use color_eyre::{
    Result,
    eyre::{WrapErr, bail},
};
use log::{info, warn};
use rand::Rng;
use std::path::{Path, PathBuf};

#[cfg(feature = "cuda")]
pub type TrainBackend = burn::backend::Cuda<f32, i32>;
#[cfg(not(feature = "cuda"))]
pub type TrainBackend = burn::backend::NdArray<f32>;
pub type TrainAutodiffBackend = burn::backend::Autodiff<TrainBackend>;

pub const FINAL_MODEL_NAME: &str = "color_encoder";

#[derive(Config)]
pub struct TrainingConfig {
    pub optimizer: AdamConfig,

    /// `R34` or `R50`.
    pub backbone: String,

    #[config(default = 10)]
    pub num_epochs: usize,

    #[config(default = 8)]
    pub batch_size: usize,

    /// Write a checkpoint every this many epochs.
    #[config(default = 2)]
    pub save_every: usize,

    #[config(default = 0)]
    pub num_workers: usize,

    /// Drawn at startup when unset.
    pub seed: Option<u64>,

    #[config(default = 3.0e-4)]
    pub learning_rate: f64,

    #[config(default = "IMAGE_SIZE")]
    pub image_size: u32,

    #[config(default = 25)]
    pub log_every: usize,

    #[config(default = "NormalizeConfig::new()")]
    pub normalize: NormalizeConfig,
}

impl TrainingConfig {
    /// Adam with weight decay 1e-5 on a ResNet-34.
    pub fn color_encoder_default() -> Self {
        let optimizer =
            AdamConfig::new().with_weight_decay(Some(WeightDecayConfig::new(1.0e-5)));
        TrainingConfig::new(optimizer, Backbone::default().to_string())
    }
}

/// Entry point used by `main`: resolves config, seed and device, then trains.
pub fn training_loop(paths: &AppPaths) -> Result<()> {
    let config = match &paths.config_path {
        Some(path) => TrainingConfig::load(path)
            .wrap_err_with(|| format!("Failed to read training config {path:?}"))?,
        None => TrainingConfig::color_encoder_default(),
    };
    let backbone: Backbone = config
        .backbone
        .parse()
        .wrap_err("Correct model not selected")?;

    let seed = config
        .seed
        .unwrap_or_else(|| rand::rng().random_range(1..=10_000));
    info!("Random seed: {seed}");

    let device = <TrainBackend as Backend>::Device::default();
    info!("Device: {device:?}");

    let mut model = ColorEncoder::<TrainAutodiffBackend>::new(backbone, &device);
    if let Some(weights) = &paths.pretrained_weights {
        let record = load_backbone_record(weights, &device)?;
        model = model.with_backbone_record(record);
        info!("Pretrained {backbone} backbone loaded from {weights:?}");
    }

    train(paths, config.with_seed(Some(seed)), model, device)
        .wrap_err("Color encoder training failed")?;
    Ok(())
}

fn create_artifact_dir(artifact_dir: &Path) -> Result<()> {
    // Remove existing artifacts before to get a clean run
    std::fs::remove_dir_all(artifact_dir).ok();
    std::fs::create_dir_all(artifact_dir)
        .wrap_err_with(|| format!("Failed to create artifact dir {artifact_dir:?}"))
}

fn load_valid_pairs(root: &Path) -> Option<Vec<ImagePair>> {
    if !root.exists() {
        warn!("Validation directory {root:?} not found, skipping validation");
        return None;
    }
    match find_image_pairs(root) {
        Ok(pairs) => Some(pairs),
        Err(e) => {
            warn!("No usable validation pairs ({e}), skipping validation");
            None
        }
    }
}

pub fn train<B: AutodiffBackend>(
    paths: &AppPaths,
    config: TrainingConfig,
    mut model: ColorEncoder<B>,
    device: B::Device,
) -> Result<ColorEncoder<B>> {
    let Some(seed) = config.seed else {
        bail!("Training config carries no seed");
    };
    if config.batch_size == 0 || config.save_every == 0 {
        bail!("batch_size and save_every must be positive");
    }

    create_artifact_dir(&paths.artifact_dir)?;
    config
        .save(paths.artifact_dir.join("config.json"))
        .wrap_err("Failed to save training config JSON")?;

    B::seed(seed);

    let train_ds = ColorPairDataset::new(&paths.train_root, config.image_size)
        .wrap_err("Failed to load training dataset")?;
    info!("The number of Data: {}", train_ds.len());
    if train_ds.len() < config.batch_size {
        bail!(
            "Training set has {} pairs, fewer than one batch of {}",
            train_ds.len(),
            config.batch_size
        );
    }
    let steps = steps_per_epoch(train_ds.len(), config.batch_size);
    let valid_pairs = load_valid_pairs(&paths.valid_root);

    let batcher_train = ColorBatcher::train(
        seed,
        AugmentationConfig::default(),
        config.normalize.clone(),
    );
    let mut builder = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(seed);
    if config.num_workers > 0 {
        builder = builder.num_workers(config.num_workers);
    }
    let dataloader_train = builder.build(train_ds);

    let mut optim = config.optimizer.init::<B, ColorEncoder<B>>();
    let loss_fn = MseLoss::new();
    let mut best_psnr = f32::NEG_INFINITY;

    info!("Starting training with {} epochs", config.num_epochs);

    for epoch in 1..config.num_epochs + 1 {
        let mut total_loss = 0.0;
        let mut batch_count = 0;

        for (iteration, batch) in dataloader_train.iter().enumerate() {
            let ColorBatch { images, targets } = batch;
            // Drop incomplete trailing batches.
            if targets.dims()[0] < config.batch_size {
                continue;
            }

            let output = model.forward(images);
            let loss = loss_fn.forward(output, targets, Reduction::Mean);
            let loss_value = loss.clone().into_scalar().elem::<f32>();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(config.learning_rate, model, grads);

            if iteration % config.log_every.max(1) == 0 {
                info!(
                    "[Train - Epoch {} - Iteration {}] Loss {:.6}",
                    epoch, iteration, loss_value
                );
            }

            total_loss += loss_value;
            batch_count += 1;
        }

        if batch_count != steps {
            bail!(
                "Epoch {epoch} ran {batch_count} of {steps} batches, the data loader ended early"
            );
        }
        let train_loss = total_loss / batch_count as f32;
        info!("Epoch {epoch}: Train Loss {train_loss:.6}");

        if let Some(pairs) = &valid_pairs {
            let model_valid = model.valid();
            let report = validate_epoch(
                &model_valid,
                pairs,
                config.image_size,
                &config.normalize,
                &device,
            )
            .wrap_err("Validation epoch failed")?;

            info!(
                "Epoch {}: Val Loss {:.6} | PSNR scan {} -> corrected {} ({} pairs, {} skipped)",
                epoch,
                report.loss,
                fmt_db(report.psnr_scan),
                fmt_db(report.psnr_corrected),
                report.evaluated,
                report.skipped
            );

            if let Some(psnr) = report.psnr_corrected
                && psnr > best_psnr
            {
                best_psnr = psnr;
                model
                    .clone()
                    .save_file(paths.artifact_dir.join("best_model"), &CompactRecorder::new())
                    .wrap_err("Failed saving best_model checkpoint")?;
            }
        }

        if epoch % config.save_every == 0 {
            let path = checkpoint_path(&paths.artifact_dir, epoch);
            model
                .clone()
                .save_file(path.clone(), &CompactRecorder::new())
                .wrap_err_with(|| format!("Failed saving checkpoint for epoch {epoch}"))?;
            info!("Checkpoint saved to {path:?}");
        }
    }

    std::fs::create_dir_all(&paths.weights_final_dir)
        .wrap_err("Failed to create model final directory")?;
    let final_path = paths.weights_final_dir.join(FINAL_MODEL_NAME);
    model
        .clone()
        .save_file(final_path.clone(), &CompactRecorder::new())
        .wrap_err("Failed saving final model")?;
    info!("Final model saved to {final_path:?}");

    Ok(model)
}

/// Full batches per epoch; a trailing partial batch is dropped.
pub fn steps_per_epoch(len: usize, batch_size: usize) -> usize {
    len / batch_size
}

pub fn checkpoint_path(artifact_dir: &Path, epoch: usize) -> PathBuf {
    artifact_dir.join(format!("model_epoch_{epoch}"))
}

fn fmt_db(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{v:.2} dB"),
        None => "n/a".to_string(),
    }
}
