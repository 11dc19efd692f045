use crate::common::TARGET_DIM;
use crate::model::backbone::Backbone;
use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
    tensor::activation::sigmoid,
};

/// Two-layer head with a sigmoid so every predicted statistic lies in `[0, 1]`.
#[derive(Module, Debug)]
pub struct MlpHead<B: Backend> {
    fc1: Linear<B>,
    relu: Relu,
    fc2: Linear<B>,
}

impl<B: Backend> MlpHead<B> {
    pub fn new(in_features: usize, hidden: usize, device: &Device<B>) -> Self {
        MlpHead {
            fc1: LinearConfig::new(in_features, hidden).init(device),
            relu: Relu::new(),
            fc2: LinearConfig::new(hidden, TARGET_DIM).init(device),
        }
    }

    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.fc1.forward(features);
        let x = self.relu.forward(x);
        sigmoid(self.fc2.forward(x))
    }
}

#[derive(Module, Debug)]
pub enum RegressionHead<B: Backend> {
    /// Bias-free linear projection, unbounded output.
    Linear(Linear<B>),
    Mlp(MlpHead<B>),
}

impl<B: Backend> RegressionHead<B> {
    pub fn new(backbone: Backbone, device: &Device<B>) -> Self {
        let in_features = backbone.feature_dim();
        match backbone {
            Backbone::ResNet34 => RegressionHead::Linear(
                LinearConfig::new(in_features, TARGET_DIM)
                    .with_bias(false)
                    .init(device),
            ),
            Backbone::ResNet50 => RegressionHead::Mlp(MlpHead::new(in_features, 512, device)),
        }
    }

    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            RegressionHead::Linear(fc) => fc.forward(features),
            RegressionHead::Mlp(head) => head.forward(features),
        }
    }
}
