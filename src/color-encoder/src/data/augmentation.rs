use image::{
    Rgb,
    imageops::{flip_horizontal, flip_vertical, rotate90, rotate180, rotate270},
};
use imageproc::{definitions::Image, noise::gaussian_noise};
use rand::prelude::*;

/// Augmentations applied to scan images during training.
///
/// Flips and quarter turns only permute pixels, so the per-channel statistics of the
/// input are untouched and the clean target stays valid. Noise is kept small for the
/// same reason.
#[derive(Clone, Debug)]
pub struct AugmentationConfig {
    /// Probability of a horizontal flip
    pub hflip_prob: f32,
    /// Probability of a vertical flip
    pub vflip_prob: f32,
    /// Probability of a random quarter turn (90, 180 or 270 degrees)
    pub rotate_prob: f32,
    /// Probability of applying Gaussian noise
    pub gaussian_prob: f32,
    /// Gaussian noise standard deviation, in 8-bit units
    pub gaussian_noise_std: f64,
    /// Gaussian noise mean, in 8-bit units
    pub gaussian_noise_mean: f64,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        AugmentationConfig {
            hflip_prob: 0.5,
            vflip_prob: 0.5,
            rotate_prob: 0.5,
            gaussian_prob: 0.3,
            gaussian_noise_std: 2.0,
            gaussian_noise_mean: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImageAugmenter {
    config: AugmentationConfig,
}

impl ImageAugmenter {
    pub fn new(config: AugmentationConfig) -> Self {
        ImageAugmenter { config }
    }

    pub fn augment<R: Rng>(&self, img: &Image<Rgb<u8>>, rng: &mut R) -> Image<Rgb<u8>> {
        let out_img = self.flip_image(img, rng);
        let out_img = self.rotate_image(&out_img, rng);
        self.noise_image(&out_img, rng)
    }

    fn flip_image<R: Rng>(&self, img: &Image<Rgb<u8>>, rng: &mut R) -> Image<Rgb<u8>> {
        let mut out = img.clone();
        if rng.random::<f32>() < self.config.hflip_prob {
            out = flip_horizontal(&out);
        }
        if rng.random::<f32>() < self.config.vflip_prob {
            out = flip_vertical(&out);
        }
        out
    }

    fn rotate_image<R: Rng>(&self, img: &Image<Rgb<u8>>, rng: &mut R) -> Image<Rgb<u8>> {
        if rng.random::<f32>() >= self.config.rotate_prob {
            return img.clone();
        }
        // Square inputs keep their shape under every quarter turn.
        if img.width() != img.height() {
            return rotate180(img);
        }
        match rng.random_range(0..3) {
            0 => rotate90(img),
            1 => rotate180(img),
            _ => rotate270(img),
        }
    }

    fn noise_image<R: Rng>(&self, img: &Image<Rgb<u8>>, rng: &mut R) -> Image<Rgb<u8>> {
        let seed = rng.random::<u64>();
        if rng.random::<f32>() < self.config.gaussian_prob {
            gaussian_noise(
                img,
                self.config.gaussian_noise_mean,
                self.config.gaussian_noise_std,
                seed,
            )
        } else {
            img.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::channel_stats, data::conversion::to_unit_float};
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;

    fn sample() -> Image<Rgb<u8>> {
        Image::from_fn(12, 12, |x, y| {
            Rgb([(x * 20) as u8, (y * 20) as u8, ((x + y) * 10) as u8])
        })
    }

    #[test]
    fn geometric_augmentation_keeps_statistics() {
        let augmenter = ImageAugmenter::new(AugmentationConfig {
            hflip_prob: 1.0,
            vflip_prob: 1.0,
            rotate_prob: 1.0,
            gaussian_prob: 0.0,
            ..AugmentationConfig::default()
        });
        let img = sample();
        let before = channel_stats(&to_unit_float(&img));

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5 {
            let out = augmenter.augment(&img, &mut rng);
            assert_eq!(out.dimensions(), img.dimensions());
            let after = channel_stats(&to_unit_float(&out));
            for c in 0..3 {
                assert_abs_diff_eq!(before.mean[c], after.mean[c], epsilon = 1e-6);
                assert_abs_diff_eq!(before.std[c], after.std[c], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn same_seed_same_output() {
        let augmenter = ImageAugmenter::new(AugmentationConfig {
            gaussian_prob: 1.0,
            ..AugmentationConfig::default()
        });
        let img = sample();

        let a = augmenter.augment(&img, &mut StdRng::seed_from_u64(42));
        let b = augmenter.augment(&img, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn disabled_augmentation_is_identity() {
        let augmenter = ImageAugmenter::new(AugmentationConfig {
            hflip_prob: 0.0,
            vflip_prob: 0.0,
            rotate_prob: 0.0,
            gaussian_prob: 0.0,
            ..AugmentationConfig::default()
        });
        let img = sample();
        assert_eq!(augmenter.augment(&img, &mut StdRng::seed_from_u64(1)), img);
    }
}
