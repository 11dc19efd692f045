use crate::model::backbone::Backbone;
use burn::{
    nn::{
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
        conv::{Conv2d, Conv2dConfig},
    },
    prelude::*,
};

fn conv<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    kernel: usize,
    stride: usize,
    device: &Device<B>,
) -> Conv2d<B> {
    let pad = kernel / 2;
    Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(pad, pad))
        .with_bias(false)
        .init(device)
}

#[derive(Module, Debug)]
pub struct DownsampleBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
}

impl<B: Backend> DownsampleBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, device: &Device<B>) -> Self {
        let conv = conv(in_channels, out_channels, 1, stride, device);
        let norm = BatchNormConfig::new(out_channels).init(device);

        DownsampleBlock { conv, norm }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        self.norm.forward(x)
    }

    /// A projection shortcut is needed whenever the block changes shape.
    fn needed(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &Device<B>,
    ) -> Option<Self> {
        (stride != 1 || in_channels != out_channels)
            .then(|| DownsampleBlock::new(in_channels, out_channels, stride, device))
    }
}

/// Two 3x3 convolutions (ResNet-18/34).
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B, 2>,
    relu: Relu,
    downsample: Option<DownsampleBlock<B>>,
}

impl<B: Backend> BasicBlock<B> {
    pub fn init(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &Device<B>,
    ) -> Self {
        BasicBlock {
            conv1: conv(in_channels, out_channels, 3, stride, device),
            norm1: BatchNormConfig::new(out_channels).init(device),
            conv2: conv(out_channels, out_channels, 3, 1, device),
            norm2: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            downsample: DownsampleBlock::needed(in_channels, out_channels, stride, device),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = input.clone();

        let x = self.conv1.forward(input);
        let x = self.norm1.forward(x);
        let x = self.relu.forward(x);
        let x = self.conv2.forward(x);
        let x = self.norm2.forward(x);

        let x = match &self.downsample {
            Some(downsample) => x + downsample.forward(identity),
            None => x + identity,
        };

        self.relu.forward(x)
    }
}

/// 1x1 -> 3x3 -> 1x1 bottleneck (ResNet-50 and deeper).
#[derive(Module, Debug)]
pub struct Bottleneck<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B, 2>,
    conv3: Conv2d<B>,
    norm3: BatchNorm<B, 2>,
    relu: Relu,
    downsample: Option<DownsampleBlock<B>>,
}

impl<B: Backend> Bottleneck<B> {
    pub fn init(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &Device<B>,
    ) -> Self {
        let inter_out_channels = out_channels / 4;

        Bottleneck {
            conv1: conv(in_channels, inter_out_channels, 1, 1, device),
            norm1: BatchNormConfig::new(inter_out_channels).init(device),
            conv2: conv(inter_out_channels, inter_out_channels, 3, stride, device),
            norm2: BatchNormConfig::new(inter_out_channels).init(device),
            conv3: conv(inter_out_channels, out_channels, 1, 1, device),
            norm3: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            downsample: DownsampleBlock::needed(in_channels, out_channels, stride, device),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = input.clone();

        let x = self.conv1.forward(input);
        let x = self.norm1.forward(x);
        let x = self.relu.forward(x);
        let x = self.conv2.forward(x);
        let x = self.norm2.forward(x);
        let x = self.relu.forward(x);
        let x = self.conv3.forward(x);
        let x = self.norm3.forward(x);

        // Skip connection
        let x = match &self.downsample {
            Some(downsample) => x + downsample.forward(identity),
            None => x + identity,
        };

        self.relu.forward(x)
    }
}

#[derive(Module, Debug)]
pub enum ResidualBlock<B: Backend> {
    Basic(BasicBlock<B>),
    Bottleneck(Bottleneck<B>),
}

impl<B: Backend> ResidualBlock<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            ResidualBlock::Basic(block) => block.forward(input),
            ResidualBlock::Bottleneck(block) => block.forward(input),
        }
    }
}

#[derive(Module, Debug)]
pub struct LayerBlock<B: Backend> {
    blocks: Vec<ResidualBlock<B>>,
}

impl<B: Backend> LayerBlock<B> {
    pub fn new(
        backbone: Backbone,
        num_blocks: usize,
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &Device<B>,
    ) -> Self {
        let blocks = (0..num_blocks)
            .map(|b| {
                // Only the first block strides and changes width.
                let (in_channels, stride) = if b == 0 {
                    (in_channels, stride)
                } else {
                    (out_channels, 1)
                };
                match backbone {
                    Backbone::ResNet34 => ResidualBlock::Basic(BasicBlock::init(
                        in_channels,
                        out_channels,
                        stride,
                        device,
                    )),
                    Backbone::ResNet50 => ResidualBlock::Bottleneck(Bottleneck::init(
                        in_channels,
                        out_channels,
                        stride,
                        device,
                    )),
                }
            })
            .collect();

        LayerBlock { blocks }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = input;

        for block in &self.blocks {
            x = block.forward(x);
        }

        x
    }
}
