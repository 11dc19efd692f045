use crate::model::{
    backbone::Backbone,
    head::RegressionHead,
    resnet::{ResNet, ResNetRecord},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, RecorderError},
};
use std::path::Path;

/// ResNet backbone with a 6-value regression head predicting clean color statistics.
#[derive(Module, Debug)]
pub struct ColorEncoder<B: Backend> {
    backbone: ResNet<B>,
    head: RegressionHead<B>,
}

impl<B: Backend> ColorEncoder<B> {
    pub fn new(backbone: Backbone, device: &Device<B>) -> Self {
        ColorEncoder {
            backbone: ResNet::new(backbone, device),
            head: RegressionHead::new(backbone, device),
        }
    }

    /// Replaces the backbone weights, keeping the freshly initialised head.
    pub fn with_backbone_record(mut self, record: ResNetRecord<B>) -> Self {
        self.backbone = self.backbone.load_record(record);
        self
    }

    /// Restores a checkpoint written with [`CompactRecorder`].
    pub fn load_weights(
        backbone: Backbone,
        path: &Path,
        device: &Device<B>,
    ) -> Result<Self, RecorderError> {
        ColorEncoder::new(backbone, device).load_file(
            path.to_path_buf(),
            &CompactRecorder::new(),
            device,
        )
    }

    /// `[N, 3, H, W]` normalized scans to `[N, 6]` clean statistics.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(images);
        self.head.forward(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TARGET_DIM;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn resnet34_output_shape() {
        let device = Default::default();
        let model = ColorEncoder::<TestBackend>::new(Backbone::ResNet34, &device);
        let out = model.forward(Tensor::zeros([2, 3, 32, 32], &device));
        assert_eq!(out.dims(), [2, TARGET_DIM]);
    }

    #[test]
    fn resnet50_output_is_bounded() {
        let device = Default::default();
        let model = ColorEncoder::<TestBackend>::new(Backbone::ResNet50, &device);
        let input = Tensor::random([1, 3, 32, 32], burn::tensor::Distribution::Default, &device);
        let out = model.forward(input);
        assert_eq!(out.dims(), [1, TARGET_DIM]);

        let values = out.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn checkpoint_roundtrip() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoder");

        let model = ColorEncoder::<TestBackend>::new(Backbone::ResNet34, &device);
        let input = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        let expected = model
            .forward(input.clone())
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        model
            .save_file(path.clone(), &CompactRecorder::new())
            .unwrap();

        let restored =
            ColorEncoder::<TestBackend>::load_weights(Backbone::ResNet34, &path, &device).unwrap();
        let got = restored.forward(input).into_data().to_vec::<f32>().unwrap();
        // CompactRecorder stores half precision.
        let scale = expected.iter().fold(1.0f32, |m, v| m.max(v.abs()));
        for (a, b) in expected.iter().zip(&got) {
            assert!((a - b).abs() < 2e-2 * scale, "{a} vs {b}");
        }
    }
}
