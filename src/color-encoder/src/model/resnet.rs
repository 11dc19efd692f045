use crate::model::{backbone::Backbone, blocks::LayerBlock};
use burn::{
    nn::{
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
    },
    prelude::*,
};

/// ResNet feature extractor: everything up to and including global average pooling.
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    relu: Relu,
    maxpool: MaxPool2d,
    layer1: LayerBlock<B>,
    layer2: LayerBlock<B>,
    layer3: LayerBlock<B>,
    layer4: LayerBlock<B>,
    avgpool: AdaptiveAvgPool2d,
}

impl<B: Backend> ResNet<B> {
    pub fn new(backbone: Backbone, device: &Device<B>) -> Self {
        let blocks = backbone.layers();
        let expansion = backbone.expansion();

        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let norm1 = BatchNormConfig::new(64).init(device);
        let relu = Relu::new();
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        // Initialize Residual blocks
        let layer1 = LayerBlock::new(backbone, blocks[0], 64, 64 * expansion, 1, device);
        let layer2 = LayerBlock::new(
            backbone,
            blocks[1],
            64 * expansion,
            128 * expansion,
            2,
            device,
        );
        let layer3 = LayerBlock::new(
            backbone,
            blocks[2],
            128 * expansion,
            256 * expansion,
            2,
            device,
        );
        let layer4 = LayerBlock::new(
            backbone,
            blocks[3],
            256 * expansion,
            512 * expansion,
            2,
            device,
        );

        let avgpool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        ResNet {
            conv1,
            norm1,
            relu,
            maxpool,
            layer1,
            layer2,
            layer3,
            layer4,
            avgpool,
        }
    }

    /// `[N, 3, H, W]` images to `[N, feature_dim]` pooled features.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(input);
        let x = self.norm1.forward(x);
        let x = self.relu.forward(x);
        let x = self.maxpool.forward(x);

        let x = self.layer1.forward(x);
        let x = self.layer2.forward(x);
        let x = self.layer3.forward(x);
        let x = self.layer4.forward(x);

        let x = self.avgpool.forward(x);
        x.flatten(1, 3)
    }
}
