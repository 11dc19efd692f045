use crate::{
    color::{ColorStats, channel_stats},
    common::{CHANNELS, TARGET_DIM},
    error::{ColorError, Result},
};

use burn::{prelude::*, tensor::Tensor};
use color_eyre::eyre::{bail, eyre};
use image::{Rgb, Rgb32FImage, RgbImage, imageops::FilterType};
use std::path::Path;

/// Decodes an image, converts it to RGB and resizes it to `size x size`.
pub fn load_rgb_image(path: &Path, size: u32) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| ColorError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let img = img.resize_exact(size, size, FilterType::CatmullRom);
    Ok(img.to_rgb8())
}

/// Maps 8-bit samples onto `[0, 1]`.
pub fn to_unit_float(img: &RgbImage) -> Rgb32FImage {
    Rgb32FImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y).0;
        Rgb(p.map(|v| v as f32 / 255.0))
    })
}

/// Loads a resized float image together with its color statistics.
pub fn load_and_preprocess_image(path: &Path, size: u32) -> Result<(Rgb32FImage, ColorStats)> {
    let img = to_unit_float(&load_rgb_image(path, size)?);
    let stats = channel_stats(&img);
    Ok((img, stats))
}

/// Planar `[1, C, H, W]` tensor with values in `[0, 1]`.
pub fn convert_image_to_tensor<B: Backend>(img: &RgbImage, device: &B::Device) -> Tensor<B, 4> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let hw = height * width;
    let mut buf = vec![0f32; CHANNELS * hw];
    for (x, y, pixel) in img.enumerate_pixels() {
        let idx = y as usize * width + x as usize;
        let p = pixel.0;
        buf[idx] = p[0] as f32 / 255.0;
        buf[hw + idx] = p[1] as f32 / 255.0;
        buf[2 * hw + idx] = p[2] as f32 / 255.0;
    }
    Tensor::<B, 3>::from_data(
        TensorData::new(buf, [CHANNELS, height, width]).convert::<B::FloatElem>(),
        device,
    )
    .reshape([1, CHANNELS, height, width])
}

pub fn convert_target_to_tensor<B: Backend>(
    target: &[f32; TARGET_DIM],
    device: &B::Device,
) -> Tensor<B, 2> {
    Tensor::from_data(
        TensorData::new(target.to_vec(), [1, TARGET_DIM]).convert::<B::FloatElem>(),
        device,
    )
}

/// Splits an `[N, 6]` prediction into one `ColorStats` per row.
pub fn convert_tensor_to_stats<B: Backend>(
    output: Tensor<B, 2>,
) -> color_eyre::Result<Vec<ColorStats>> {
    let [rows, cols] = output.dims();
    if cols != TARGET_DIM {
        bail!("Expected {TARGET_DIM} outputs per sample, got {cols}");
    }
    let values = output
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| eyre!("Failed to read prediction tensor: {e:?}"))?;

    values
        .chunks_exact(TARGET_DIM)
        .take(rows)
        .map(|row| ColorStats::from_vector(row).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn tensor_layout_is_planar() {
        let device = Default::default();
        let mut img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        img.put_pixel(2, 1, Rgb([255, 51, 0]));

        let t = convert_image_to_tensor::<TestBackend>(&img, &device);
        assert_eq!(t.dims(), [1, 3, 2, 3]);

        let v = t.into_data().to_vec::<f32>().unwrap();
        // Last pixel of each plane.
        assert_eq!(v[5], 1.0);
        assert_eq!(v[11], 0.2);
        assert_eq!(v[17], 0.0);
        assert_eq!(v.iter().filter(|x| **x != 0.0).count(), 2);
    }

    #[test]
    fn predictions_split_into_stats() {
        let device = Default::default();
        let rows = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(
                vec![
                    0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6, //
                    0.6, 0.5, 0.4, 0.3, 0.2, 0.1,
                ],
                [2, TARGET_DIM],
            ),
            &device,
        );
        let stats = convert_tensor_to_stats(rows).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].mean, [0.1, 0.2, 0.3]);
        assert_eq!(stats[1].std, [0.3, 0.2, 0.1]);
    }

    #[test]
    fn unit_float_scale() {
        let img = RgbImage::from_pixel(2, 2, Rgb([0, 51, 255]));
        let f = to_unit_float(&img);
        assert_eq!(f.get_pixel(1, 1).0, [0.0, 0.2, 1.0]);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_rgb_image(Path::new("/nonexistent/scan.png"), 8).unwrap_err();
        assert!(matches!(err, ColorError::ImageLoad { .. }));
    }
}
