use crate::model::resnet::ResNetRecord;
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use color_eyre::{
    Result,
    eyre::{WrapErr, bail},
};
use std::path::Path;

/// Reads a torchvision ResNet state dict into a backbone record.
///
/// The torchvision `fc.*` classifier has no counterpart in [`ResNet`](crate::model::resnet::ResNet)
/// and is not mapped.
pub fn load_backbone_record<B: Backend>(
    path: &Path,
    device: &Device<B>,
) -> Result<ResNetRecord<B>> {
    if !path.exists() {
        bail!("Missing weights file: {path:?}. Expected a PyTorch ResNet state dict.");
    }

    let load_args = LoadArgs::new(path.to_path_buf())
        // Map top-level batchnorm 'bn1' to 'norm1'
        .with_key_remap(r"^bn1\.(.+)$", "norm1.$1")
        // Map layer blocks convolution parameters
        .with_key_remap(
            r"^layer([1-4])\.(\d+)\.conv([123])\.(.+)$",
            "layer$1.blocks.$2.conv$3.$4",
        )
        // Map layer blocks batchnorm parameters
        .with_key_remap(
            r"^layer([1-4])\.(\d+)\.bn([123])\.(.+)$",
            "layer$1.blocks.$2.norm$3.$4",
        )
        // Map downsample convolution in blocks
        .with_key_remap(
            r"^layer([1-4])\.(\d+)\.downsample\.0\.(.+)$",
            "layer$1.blocks.$2.downsample.conv.$3",
        )
        // Map downsample batchnorm in blocks
        .with_key_remap(
            r"^layer([1-4])\.(\d+)\.downsample\.1\.(.+)$",
            "layer$1.blocks.$2.downsample.norm.$3",
        );

    PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(load_args, device)
        .wrap_err_with(|| format!("Failed to load / map PyTorch ResNet state from {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn missing_weights_file() {
        let device = Default::default();
        let err = match load_backbone_record::<NdArray<f32>>(
            Path::new("/nonexistent/r34.pth"),
            &device,
        ) {
            Ok(_) => panic!("loading a missing weights file succeeded"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("Missing weights file"));
    }
}
