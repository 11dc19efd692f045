use std::path::PathBuf;

/// Filesystem locations for a training run, read from the environment.
#[derive(Clone, Debug)]
pub struct AppPaths {
    pub train_root: PathBuf,
    pub valid_root: PathBuf,
    pub artifact_dir: PathBuf,
    pub weights_final_dir: PathBuf,
    /// PyTorch ResNet state dict used to initialise the backbone, if any.
    pub pretrained_weights: Option<PathBuf>,
    /// JSON `TrainingConfig`; defaults are used when unset.
    pub config_path: Option<PathBuf>,
    /// Directory receiving `log_ColorEncoder_<timestamp>.txt`; logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
}

impl AppPaths {
    pub fn from_env() -> Self {
        Self {
            train_root: env_path("TRAIN_PATH").unwrap_or_else(|| "data/Descan/Train".into()),
            valid_root: env_path("VALID_PATH").unwrap_or_else(|| "data/Descan/Valid".into()),
            artifact_dir: env_path("ARTIFACT_DIR")
                .unwrap_or_else(|| "/tmp/color_encoder_artifacts".into()),
            weights_final_dir: env_path("WEIGHTS_FINAL_DIR")
                .unwrap_or_else(|| "../weights_final".into()),
            pretrained_weights: env_path("PRETRAINED_WEIGHTS"),
            config_path: env_path("CONFIG_PATH"),
            log_dir: env_path("LOG_DIR"),
        }
    }

    pub fn log_file(&self, timestamp: u64) -> Option<PathBuf> {
        self.log_dir
            .as_ref()
            .map(|dir| dir.join(format!("log_ColorEncoder_{timestamp}.txt")))
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
