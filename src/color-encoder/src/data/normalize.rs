use burn::{prelude::*, tensor::Tensor};

/// Per-channel input normalization applied before the backbone.
///
/// Defaults to the ImageNet statistics the ResNet backbones were trained with. This is
/// independent from the color statistics the model predicts.
#[derive(Config, Debug)]
pub struct NormalizeConfig {
    #[config(default = "[0.485, 0.456, 0.406]")]
    pub mean: [f32; 3],
    #[config(default = "[0.229, 0.224, 0.225]")]
    pub std: [f32; 3],
}

fn channel_tensor<B: Backend>(values: [f32; 3], device: &B::Device) -> Tensor<B, 4> {
    Tensor::from_data(
        TensorData::new(values.to_vec(), [1, 3, 1, 1]).convert::<B::FloatElem>(),
        device,
    )
}

pub fn normalize<B: Backend>(tensor: Tensor<B, 4>, config: &NormalizeConfig) -> Tensor<B, 4> {
    let device = tensor.device();
    let mean = channel_tensor::<B>(config.mean, &device);
    let std = channel_tensor::<B>(config.std, &device);

    (tensor - mean) / std
}
