use burn::{
    backend::{Autodiff, NdArray},
    config::Config,
};
use color_encoder::{
    Backbone, ColorEncoder,
    data::loader::{CLEAN_DIR, SCAN_DIR},
    model::training::{
        FINAL_MODEL_NAME, TrainingConfig, checkpoint_path, steps_per_epoch, train, training_loop,
    },
    utils::app_paths::AppPaths,
};
use image::{Rgb, RgbImage};
use std::path::Path;

type TestBackend = Autodiff<NdArray<f32>>;

/// Writes `count` pairs where the scan is a darker, lower-contrast copy of the clean page.
fn write_dataset(root: &Path, count: u32) {
    std::fs::create_dir_all(root.join(CLEAN_DIR)).unwrap();
    std::fs::create_dir_all(root.join(SCAN_DIR)).unwrap();
    for i in 0..count {
        let clean = RgbImage::from_fn(32, 32, |x, y| {
            Rgb([
                (x * 6 + i * 10) as u8,
                (y * 6) as u8,
                ((x + y) * 3 + 20) as u8,
            ])
        });
        let scan = RgbImage::from_fn(32, 32, |x, y| {
            let p = clean.get_pixel(x, y).0;
            Rgb(p.map(|v| (v as f32 * 0.6 + 30.0) as u8))
        });
        let name = format!("page_{i:03}.png");
        clean.save(root.join(CLEAN_DIR).join(&name)).unwrap();
        scan.save(root.join(SCAN_DIR).join(&name)).unwrap();
    }
}

fn paths_in(dir: &Path) -> AppPaths {
    AppPaths {
        train_root: dir.join("train"),
        valid_root: dir.join("valid"),
        artifact_dir: dir.join("artifacts"),
        weights_final_dir: dir.join("weights_final"),
        pretrained_weights: None,
        config_path: None,
        log_dir: None,
    }
}

#[test]
fn trains_and_writes_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(dir.path());
    write_dataset(&paths.train_root, 3);
    write_dataset(&paths.valid_root, 2);

    let config = TrainingConfig::color_encoder_default()
        .with_seed(Some(11))
        .with_batch_size(2)
        .with_num_epochs(2)
        .with_save_every(1)
        .with_image_size(32);

    // Three pairs in batches of two: the trailing single pair is dropped and
    // `train` fails if an epoch runs any other number of steps.
    assert_eq!(steps_per_epoch(3, config.batch_size), 1);

    let device = Default::default();
    let model = ColorEncoder::<TestBackend>::new(Backbone::ResNet34, &device);
    train(&paths, config, model, device.clone()).unwrap();

    assert!(paths.artifact_dir.join("config.json").exists());
    for epoch in 1..=2 {
        let ckpt = checkpoint_path(&paths.artifact_dir, epoch).with_extension("mpk");
        assert!(ckpt.exists(), "missing {ckpt:?}");
    }
    assert!(paths.artifact_dir.join("best_model.mpk").exists());

    let final_weights = paths.weights_final_dir.join(FINAL_MODEL_NAME);
    assert!(final_weights.with_extension("mpk").exists());
    ColorEncoder::<NdArray<f32>>::load_weights(Backbone::ResNet34, &final_weights, &device)
        .unwrap();
}

#[test]
fn corrupt_scan_fails_training() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(dir.path());
    write_dataset(&paths.train_root, 4);
    std::fs::write(paths.train_root.join(SCAN_DIR).join("page_001.png"), b"garbage").unwrap();

    let config = TrainingConfig::color_encoder_default()
        .with_seed(Some(5))
        .with_batch_size(1)
        .with_num_epochs(1)
        .with_image_size(32);
    let device = Default::default();
    let model = ColorEncoder::<TestBackend>::new(Backbone::ResNet34, &device);

    let err = train(&paths, config, model, device).unwrap_err();
    assert!(err.chain().any(|e| e.to_string().contains("page_001.png")));
    assert!(!paths.weights_final_dir.exists());
}

#[test]
fn too_few_pairs_for_a_batch() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(dir.path());
    write_dataset(&paths.train_root, 1);

    let config = TrainingConfig::color_encoder_default()
        .with_seed(Some(1))
        .with_image_size(32);
    let device = Default::default();
    let model = ColorEncoder::<TestBackend>::new(Backbone::ResNet34, &device);

    let err = train(&paths, config, model, device).unwrap_err();
    assert!(err.to_string().contains("fewer than one batch"));
}

#[test]
fn unknown_backbone_produces_no_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = paths_in(dir.path());

    let mut config = TrainingConfig::color_encoder_default();
    config.backbone = "R101".to_string();
    let config_path = dir.path().join("config.json");
    config.save(&config_path).unwrap();
    paths.config_path = Some(config_path);

    let err = training_loop(&paths).unwrap_err();
    assert!(err.chain().any(|e| e.to_string().contains("Unknown backbone")));
    assert!(!paths.artifact_dir.exists());
}
