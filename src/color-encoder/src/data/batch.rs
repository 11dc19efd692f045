use crate::data::{
    augmentation::{AugmentationConfig, ImageAugmenter},
    conversion::{convert_image_to_tensor, convert_target_to_tensor},
    loader::ColorPairItem,
    normalize::{NormalizeConfig, normalize},
};

use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::Tensor};
use log::warn;
use rand::{SeedableRng, rngs::StdRng};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatcherMode {
    Train,
    Eval,
}

#[derive(Clone)]
pub struct ColorBatcher {
    mode: BatcherMode,
    augmenter: Option<ImageAugmenter>,
    normalize: NormalizeConfig,
    // Shared by data-loader workers; seeded by the caller.
    rng: Arc<Mutex<StdRng>>,
}

impl ColorBatcher {
    pub fn train(seed: u64, augmentation: AugmentationConfig, normalize: NormalizeConfig) -> Self {
        Self {
            mode: BatcherMode::Train,
            augmenter: Some(ImageAugmenter::new(augmentation)),
            normalize,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn eval(normalize: NormalizeConfig) -> Self {
        Self {
            mode: BatcherMode::Eval,
            augmenter: None,
            normalize,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(0))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColorBatch<B: Backend> {
    /// Normalized scans, `[N, 3, H, W]`.
    pub images: Tensor<B, 4>,
    /// Clean statistics, `[N, 6]`.
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> Batcher<B, ColorPairItem, ColorBatch<B>> for ColorBatcher {
    fn batch(&self, items: Vec<ColorPairItem>, device: &B::Device) -> ColorBatch<B> {
        let images: Vec<Tensor<B, 4>> = items
            .iter()
            .map(|item| match (self.mode, &self.augmenter) {
                (BatcherMode::Train, Some(aug)) => match self.rng.lock() {
                    Ok(mut rng) => {
                        let augmented = aug.augment(&item.scan, &mut *rng);
                        convert_image_to_tensor::<B>(&augmented, device)
                    }
                    Err(e) => {
                        warn!("[augment warning] rng lock poisoned: {e}");
                        convert_image_to_tensor::<B>(&item.scan, device)
                    }
                },
                _ => convert_image_to_tensor::<B>(&item.scan, device),
            })
            .map(|tensor| normalize(tensor, &self.normalize))
            .collect();
        let targets: Vec<Tensor<B, 2>> = items
            .iter()
            .map(|item| convert_target_to_tensor(&item.target, device))
            .collect();

        ColorBatch {
            images: Tensor::cat(images, 0),
            targets: Tensor::cat(targets, 0),
        }
    }
}
