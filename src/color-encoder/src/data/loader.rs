use crate::{
    common::TARGET_DIM,
    data::conversion::{load_and_preprocess_image, load_rgb_image},
};

use burn::data::dataset::Dataset;
use color_eyre::{
    Result,
    eyre::{WrapErr, bail},
};
use image::RgbImage;
use log::{debug, error, warn};
use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::{Path, PathBuf},
};

pub const CLEAN_DIR: &str = "clean";
pub const SCAN_DIR: &str = "scan";

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// A scan image and the color statistics of its clean counterpart.
#[derive(Clone, Debug)]
pub struct ColorPairItem {
    pub scan: RgbImage,
    pub target: [f32; TARGET_DIM],
}

#[derive(Clone, Debug)]
pub struct ImagePair {
    pub clean: PathBuf,
    pub scan: PathBuf,
}

/// Pairs `root/clean/<name>` with `root/scan/<name>`, sorted by name.
pub fn find_image_pairs(root: &Path) -> Result<Vec<ImagePair>> {
    if !root.exists() {
        bail!("Dataset directory not found: {root:?}");
    }
    let clean = list_images(&root.join(CLEAN_DIR))?;
    let mut scans = list_images(&root.join(SCAN_DIR))?;

    let mut pairs = Vec::with_capacity(clean.len());
    for (name, clean_path) in clean {
        match scans.remove(&name) {
            Some(scan_path) => pairs.push(ImagePair {
                clean: clean_path,
                scan: scan_path,
            }),
            None => warn!("No scan counterpart for {clean_path:?}, skipping"),
        }
    }
    for scan_path in scans.values() {
        warn!("No clean counterpart for {scan_path:?}, skipping");
    }

    if pairs.is_empty() {
        bail!("No clean/scan image pairs found under {root:?}");
    }
    Ok(pairs)
}

fn list_images(dir: &Path) -> Result<BTreeMap<OsString, PathBuf>> {
    let entries =
        std::fs::read_dir(dir).wrap_err_with(|| format!("Failed to read directory {dir:?}"))?;

    let mut images = BTreeMap::new();
    for entry in entries {
        let path = entry.wrap_err("Failed to read directory entry")?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_image {
            continue;
        }
        if let Some(name) = path.file_name() {
            images.insert(name.to_os_string(), path);
        }
    }
    Ok(images)
}

/// Paired clean/scan dataset.
///
/// Every pair is decoded once at construction: the clean image to compute its
/// target statistics, the scan to reject unreadable files up front. Scans are
/// decoded again in [`Dataset::get`].
pub struct ColorPairDataset {
    pairs: Vec<ImagePair>,
    targets: Vec<[f32; TARGET_DIM]>,
    image_size: u32,
}

impl ColorPairDataset {
    pub fn new(root: &Path, image_size: u32) -> Result<Self> {
        let pairs = find_image_pairs(root)?;

        let targets = pairs
            .iter()
            .map(|pair| {
                let (_, stats) = load_and_preprocess_image(&pair.clean, image_size)
                    .wrap_err_with(|| format!("Failed to load clean image {:?}", pair.clean))?;
                load_rgb_image(&pair.scan, image_size)
                    .wrap_err_with(|| format!("Failed to load scan image {:?}", pair.scan))?;
                Ok(stats.to_vector())
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Loaded {} pairs from {root:?}", pairs.len());

        Ok(Self {
            pairs,
            targets,
            image_size,
        })
    }
}

impl Dataset<ColorPairItem> for ColorPairDataset {
    fn get(&self, index: usize) -> Option<ColorPairItem> {
        let pair = self.pairs.get(index)?;
        match load_rgb_image(&pair.scan, self.image_size) {
            Ok(scan) => Some(ColorPairItem {
                scan,
                target: self.targets[index],
            }),
            // Only reachable if the file changed after construction; the
            // training loop rejects the resulting short epoch.
            Err(e) => {
                error!("Failed to load scan image {:?}: {e}", pair.scan);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}
